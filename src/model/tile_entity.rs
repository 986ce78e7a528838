use mcpe_nbt::Compound;
use serde_json::{json, Map, Value};

use super::describe_point;
use super::item::{describe_items, items_properties, Item};
use crate::features::Projection;
use crate::schema::Schema;

#[derive(Debug, Clone, PartialEq)]
pub enum TileEntityKind {
    Chest(Vec<Item>),
    Sign([String; 4]),
    MobSpawner(i32),
    /// Known kinds that carry nothing worth reporting
    Recognized(String),
    Unrecognized(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileEntity {
    /// `None` unless all of `x`, `y` and `z` are present
    pub pos: Option<[i32; 3]>,
    pub pair_chest: Option<[i32; 2]>,
    pub kind: TileEntityKind,
}

fn text(c: &Compound, field: &str) -> String {
    c.get_str(field).unwrap_or_default().to_string()
}

impl TileEntity {
    /// Missing fields are left empty; the record itself is always kept
    pub fn from_compound(c: &Compound) -> Self {
        let pos = match (c.get_int("x"), c.get_int("y"), c.get_int("z")) {
            (Some(x), Some(y), Some(z)) => Some([x, y, z]),
            _ => None,
        };
        let pair_chest = match (c.get_int("pairx"), c.get_int("pairz")) {
            (Some(x), Some(z)) => Some([x, z]),
            _ => None,
        };

        let id = c.get_str("id").unwrap_or_default();
        let kind = match id {
            "Sign" => TileEntityKind::Sign([text(c, "Text1"), text(c, "Text2"), text(c, "Text3"), text(c, "Text4")]),
            "Chest" => TileEntityKind::Chest(Item::list_from(c.get_list("Items"))),
            "MobSpawner" => TileEntityKind::MobSpawner(c.get_int("EntityId").unwrap_or(0)),
            "BrewingStand" | "EnchantTable" | "Furnace" => TileEntityKind::Recognized(id.to_string()),
            other => TileEntityKind::Unrecognized(other.to_string()),
        };

        Self { pos, pair_chest, kind }
    }

    /// Whether the record has anything worth logging or mapping
    pub fn is_reportable(&self) -> bool {
        matches!(
            self.kind,
            TileEntityKind::Chest(_) | TileEntityKind::Sign(_) | TileEntityKind::MobSpawner(_)
        )
    }

    pub fn describe(&self, schema: &Schema, projection: &Projection, dimension: i32) -> String {
        let mut s = format!("[Pos={}", describe_point(self.pos, projection, dimension));
        match &self.kind {
            TileEntityKind::Chest(items) => {
                if let Some([x, z]) = self.pair_chest {
                    s.push_str(&format!(" PairChest=({x}, {z})"));
                }
                s.push_str(&format!(" Chest=[{}]", describe_items(items, schema)));
            }
            TileEntityKind::Sign(text) => s.push_str(&format!(" Sign=[{}]", text.join(" / "))),
            TileEntityKind::MobSpawner(entity_id) if *entity_id > 0 => {
                s.push_str(&format!(" MobSpawner=[Name={}]", spawner_name(*entity_id, schema)));
            }
            TileEntityKind::MobSpawner(_) | TileEntityKind::Recognized(_) | TileEntityKind::Unrecognized(_) => {}
        }
        s.push(']');
        s
    }

    /// Feature properties; `None` when there is nothing to show
    pub fn properties(&self, schema: &Schema, dimension: i32) -> Option<Map<String, Value>> {
        let mut map = Map::new();
        match &self.kind {
            TileEntityKind::Chest(items) if !items.is_empty() => {
                map.insert("Name".into(), json!("Chest"));
                if let Some(pair) = self.pair_chest {
                    map.insert("pairchest".into(), json!(pair));
                }
                let items = items_properties(items, schema, true);
                if !items.is_empty() {
                    map.insert("Items".into(), Value::Array(items));
                }
            }
            TileEntityKind::Sign([t1, t2, t3, t4]) => {
                map.insert("Name".into(), json!("Sign"));
                map.insert("Sign".into(), json!({ "Text1": t1, "Text2": t2, "Text3": t3, "Text4": t4 }));
            }
            TileEntityKind::MobSpawner(entity_id) if *entity_id > 0 => {
                map.insert("Name".into(), json!("MobSpawner"));
                map.insert(
                    "MobSpawner".into(),
                    json!({
                        "entityId": format!("{entity_id} (0x{entity_id:x})"),
                        "Name": spawner_name(*entity_id, schema),
                    }),
                );
            }
            _ => return None,
        }
        map.insert("TileEntity".into(), json!("true"));
        map.insert("Dimension".into(), json!(dimension.to_string()));
        if let Some(pos) = self.pos {
            map.insert("Pos".into(), json!(pos));
        }
        Some(map)
    }
}

/// The low byte of a spawner's EntityId is the entity type
fn spawner_name(entity_id: i32, schema: &Schema) -> String {
    let eid = entity_id & 0xff;
    match schema.entity_name(eid) {
        Some(name) => name.to_string(),
        None => format!("(UNKNOWN: id={eid} 0x{eid:x})"),
    }
}
