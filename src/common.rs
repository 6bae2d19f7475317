pub use anyhow::{bail, ensure, format_err, Context, Error};
pub use argh::FromArgs;
pub use image::{
    imageops::{self, FilterType},
    io::Reader as ImageReader,
    RgbImage,
};
pub use itertools::Itertools;
pub use log::{debug, info, warn};
pub use rayon::prelude::*;
pub use serde::{
    de::Error as DeserializeError, Deserialize, Deserializer, Serialize, Serializer,
};
pub use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
pub use tch::{Device, Kind, Tensor};

pub type Fallible<T> = anyhow::Result<T>;
