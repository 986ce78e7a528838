//! Typed records mapped from tag trees
//!
//! Every mapper reads a field only when it is present with the expected
//! kind; anything else is left as `None`.

pub mod entity;
pub mod item;
pub mod portal;
pub mod tile_entity;

use std::fmt::Display;

use serde_json::Value;

use crate::features::Projection;

pub use entity::{Entity, EntityDetail, EntityOrigin};
pub use item::{Enchantment, Item};
pub use portal::Portal;
pub use tile_entity::{TileEntity, TileEntityKind};

/// `(x, y, z @ image ix, iy)` using the text projection
pub(crate) fn describe_point<T>(point: Option<[T; 3]>, projection: &Projection, dimension: i32) -> String
where
    T: Copy + Display + Into<f64>,
{
    match point {
        Some([x, y, z]) => {
            let (ix, iy) = projection.text_point(dimension, x.into(), z.into());
            format!("({x}, {y}, {z} @ image {ix}, {iy})")
        }
        None => "(none)".to_string(),
    }
}

/// JSON number using the shortest form that round-trips the f32
pub(crate) fn float_value(v: f32) -> Value {
    v.to_string().parse::<f64>().map(Value::from).unwrap_or(Value::Null)
}
