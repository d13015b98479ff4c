#![allow(unused_imports)]

pub(crate) use crate::error::Error;
pub(crate) use crate::format_dbg;
pub(crate) use crate::rng::SimRng;
pub(crate) use crate::si;
pub(crate) use crate::traits::*;
pub(crate) use crate::uc;
pub(crate) use crate::utils;
pub(crate) use crate::utils::{almost_eq, almost_eq_uom, almost_le_uom, is_strictly_sorted};
pub(crate) use anyhow::{anyhow, bail, ensure, Context};
pub(crate) use rand::Rng;
pub(crate) use serde::{Deserialize, Serialize};
pub(crate) use std::cmp::Ordering;
pub(crate) use std::collections::HashMap;
pub(crate) use std::ffi::OsStr;
pub(crate) use std::fmt;
pub(crate) use std::fs::File;
pub(crate) use std::path::{Path, PathBuf};
pub(crate) use uom::ConstZero;
