//! NeuraNet: нейросеть с эволюционируемой топологией.
//!
//! Сеть описывается двумя плоскими массивами (хромосомами для генетического алгоритма):
//! параметрами базовых функций и связями (база, вход, выход).

mod error;
mod base_fun;
mod link;
mod neura_net;
mod layer_topology;
mod conv_net;
mod persist;
mod cloud_graph;
mod gen_alg;
mod eval_pool;
mod config;

pub use error::*;
pub use base_fun::*;
pub use link::*;
pub use neura_net::*;
pub use layer_topology::*;
pub use conv_net::*;
pub use persist::*;
pub use cloud_graph::*;
pub use gen_alg::*;
pub use eval_pool::*;
pub use config::*;

pub(crate) use std::fmt;
pub(crate) use std::fs;
pub(crate) use std::io::{BufWriter, Read, Write};
pub(crate) use std::path::{Path, PathBuf};
pub(crate) use itertools::Itertools;
pub(crate) use rand::{Rng, RngCore};
pub(crate) use serde::{Deserialize, Serialize};
