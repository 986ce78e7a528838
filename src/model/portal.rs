use mcpe_nbt::Compound;
use serde_json::{json, Map, Value};

use super::describe_point;
use crate::error::{Error, Result};
use crate::features::Projection;

const RECORD: &str = "portal";

/// Nether portal record from the `portals` key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Portal {
    pub pos: [i32; 3],
    pub dimension_id: i32,
    pub span: i8,
    pub xa: i8,
    pub za: i8,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or(Error::MissingField { record: RECORD, field })
}

impl Portal {
    pub fn from_compound(c: &Compound) -> Result<Self> {
        Ok(Self {
            dimension_id: required(c.get_int("DimId"), "DimId")?,
            span: required(c.get_byte("Span"), "Span")?,
            pos: [
                required(c.get_int("TpX"), "TpX")?,
                required(c.get_int("TpY"), "TpY")?,
                required(c.get_int("TpZ"), "TpZ")?,
            ],
            xa: required(c.get_byte("Xa"), "Xa")?,
            za: required(c.get_byte("Za"), "Za")?,
        })
    }

    /// Every portal under `data.PortalRecords`; a bad record fails on its own
    pub fn list_from_root(root: &Compound) -> Vec<Result<Portal>> {
        root.get_compound("data")
            .and_then(|data| data.get_list("PortalRecords"))
            .map(|list| list.compounds().map(Portal::from_compound).collect())
            .unwrap_or_default()
    }

    pub fn describe(&self, projection: &Projection) -> String {
        format!(
            "[Nether Portal Pos={} DimId={} Span={} Xa={} Za={}]",
            describe_point(Some(self.pos), projection, self.dimension_id),
            self.dimension_id,
            self.span,
            self.xa,
            self.za
        )
    }

    /// Shown as a tile entity so the viewer can treat it like one
    pub fn properties(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("TileEntity".into(), json!("true"));
        map.insert("Name".into(), json!("NetherPortal"));
        map.insert("DimId".into(), json!(self.dimension_id.to_string()));
        map.insert("Span".into(), json!(self.span.to_string()));
        map.insert("Xa".into(), json!(self.xa.to_string()));
        map.insert("Za".into(), json!(self.za.to_string()));
        map.insert("Dimension".into(), json!(self.dimension_id.to_string()));
        map.insert("Pos".into(), json!(self.pos));
        map
    }
}
