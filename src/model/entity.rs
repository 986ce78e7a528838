use mcpe_nbt::{Compound, Tag, TagList};
use serde_json::{json, Map, Value};

use super::item::{items_properties, Item};
use super::{describe_point, float_value};
use crate::features::Projection;
use crate::schema::Schema;

/// Mob-specific scalar fields captured verbatim, checked in this order
const OTHER_PROPS: &[&str] = &[
    "IsChickenJockey",
    "CatType",
    "Sheared",
    "Color",
    "SkeletonType",
    "Size",
    "OnGround",
    "Angry",
    "CollarColor",
    "Owner",
    "OwnerNew",
    "Profession",
    "Riches",
    "Career",
    "CareerLevel",
    "Willing",
    "Sitting",
    "InLove",
    "Age",
    "ForcedAge",
    "IsBaby",
    "Anger",
    "HurtBy",
    "carried",
    "carriedData",
    "IsPowered",
    "Health",
    "OwnerID",
    "Persistent",
    "PlayerCreated",
    "SpawnedByNight",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityOrigin {
    Mob,
    LocalPlayer,
    RemotePlayer,
}

impl EntityOrigin {
    pub fn is_player(self) -> bool {
        !matches!(self, EntityOrigin::Mob)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityDetail {
    Player {
        bed_position: Option<[i32; 3]>,
        spawn: Option<[i32; 3]>,
        dimension_id: Option<i32>,
        inventory: Vec<Item>,
    },
    Mob {
        item_in_hand: Option<Item>,
        item: Option<Item>,
        tile: Option<u8>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub origin: EntityOrigin,
    pub id: Option<i32>,
    pub pos: Option<[f32; 3]>,
    pub rotation: Option<[f32; 2]>,
    pub armor: Vec<Item>,
    pub detail: EntityDetail,
    /// `(name, rendered value)` in discovery order
    pub other: Vec<(String, String)>,
}

fn int_point(c: &Compound, keys: [&str; 3]) -> Option<[i32; 3]> {
    Some([c.get_int(keys[0])?, c.get_int(keys[1])?, c.get_int(keys[2])?])
}

fn float_list(c: &Compound, key: &str, min: usize) -> Option<Vec<f32>> {
    c.get_list(key).and_then(TagList::floats).filter(|v| v.len() >= min)
}

fn render_other(name: &str, tag: &Tag) -> Option<String> {
    match tag {
        Tag::Byte(v) => Some(format!("{v} (0x{:x})", *v as i32)),
        Tag::Short(v) => Some(format!("{v} (0x{:x})", *v as i32)),
        Tag::Int(v) => Some(format!("{v} (0x{v:x})")),
        Tag::Long(v) => Some(format!("{v} (0x{v:x})")),
        Tag::Float(v) => Some(format!("{v:.6}")),
        Tag::Double(v) => Some(format!("{v:.6}")),
        Tag::String(s) => Some(s.clone()),
        Tag::End | Tag::ByteArray(_) | Tag::List(_) | Tag::Compound(_) | Tag::IntArray(_) => {
            tracing::warn!(key = name, kind = tag.kind().name(), "Unable to capture entity other prop");
            None
        }
    }
}

impl Entity {
    pub fn from_compound(c: &Compound, origin: EntityOrigin) -> Self {
        let armor = Item::list_from(c.get_list("Armor"));

        let detail = if origin.is_player() {
            EntityDetail::Player {
                bed_position: int_point(c, ["BedPositionX", "BedPositionY", "BedPositionZ"]),
                spawn: int_point(c, ["SpawnX", "SpawnY", "SpawnZ"]),
                dimension_id: c.get_int("DimensionId"),
                inventory: Item::list_from(c.get_list("Inventory")),
            }
        } else {
            EntityDetail::Mob {
                item_in_hand: c.get_compound("ItemInHand").map(Item::from_compound),
                item: c.get_compound("Item").map(Item::from_compound),
                tile: c.get_byte("Tile").map(|b| b as u8),
            }
        };

        let other = OTHER_PROPS
            .iter()
            .filter_map(|&name| {
                let value = render_other(name, c.get(name)?)?;
                Some((name.to_string(), value))
            })
            .collect();

        Self {
            origin,
            id: c.get_int("id"),
            pos: float_list(c, "Pos", 3).map(|v| [v[0], v[1], v[2]]),
            rotation: float_list(c, "Rotation", 2).map(|v| [v[0], v[1]]),
            armor,
            detail,
            other,
        }
    }

    /// A player's own DimensionId wins over the dimension of the record holding it
    pub fn effective_dimension(&self, record_dimension: i32) -> i32 {
        match self.detail {
            EntityDetail::Player { dimension_id: Some(id), .. } => id,
            _ => record_dimension,
        }
    }

    pub fn name<'a>(&self, schema: &'a Schema) -> Option<&'a str> {
        schema.entity_name(self.id.unwrap_or(-1))
    }

    pub fn sorted_other(&self) -> Vec<(String, String)> {
        let mut other = self.other.clone();
        other.sort();
        other
    }

    /// One-line log form; positions carry text-projected image coordinates
    pub fn describe(&self, schema: &Schema, projection: &Projection, dimension: i32) -> String {
        let mut s = String::from(if self.origin.is_player() { "[Player" } else { "[Mob" });
        let id = self.id.unwrap_or(-1);
        match self.name(schema) {
            Some(name) => s.push_str(&format!(" Name={name}")),
            None => s.push_str(&format!(" Name=(UNKNOWN: id={id} 0x{id:x})")),
        }

        if let EntityDetail::Player { dimension_id: Some(id), .. } = self.detail {
            if id >= 0 {
                s.push_str(&format!(" Dimension={id}"));
            }
        }

        s.push_str(&format!(" Pos={}", describe_point(self.pos, projection, dimension)));
        match self.rotation {
            Some([a, b]) => s.push_str(&format!(" Rotation=({a}, {b})")),
            None => s.push_str(" Rotation=(none)"),
        }

        if let EntityDetail::Player { bed_position, spawn, .. } = &self.detail {
            // bed and spawn are always overworld coordinates
            s.push_str(&format!(" BedPos={}", describe_point(*bed_position, projection, 0)));
            s.push_str(&format!(" Spawn={}", describe_point(*spawn, projection, 0)));
        }

        push_item_run(&mut s, "Armor", &self.armor, schema);

        match &self.detail {
            EntityDetail::Player { inventory, .. } => push_item_run(&mut s, "Inventory", inventory, schema),
            EntityDetail::Mob { item_in_hand, item, .. } => {
                if let Some(item) = item_in_hand {
                    s.push_str(&format!(" ItemInHand={}", item.describe(schema)));
                }
                if let Some(item) = item {
                    s.push_str(&format!(" Item={}", item.describe(schema)));
                }
            }
        }

        for (k, v) in self.sorted_other() {
            s.push_str(&format!(" {k}={v}"));
        }

        if let EntityDetail::Mob { tile: Some(tile), .. } = self.detail {
            s.push_str(&format!(" Tile=[{} ({tile} 0x{tile:x})]", schema.block(tile).name));
        }

        s.push(']');
        s
    }

    /// Feature properties, in the order the viewer lists them
    pub fn properties(&self, schema: &Schema, dimension: i32) -> Map<String, Value> {
        let mut map = Map::new();
        let id = self.id.unwrap_or(-1);
        let name = match self.name(schema) {
            Some(name) => name.to_string(),
            None => format!("*UNKNOWN: id={id} 0x{id:x}"),
        };
        map.insert("Name".into(), json!(name));
        map.insert("id".into(), json!(id.to_string()));
        if self.origin.is_player() {
            map.insert("player".into(), json!("true"));
        }
        if dimension >= 0 {
            map.insert("Dimension".into(), json!(dimension.to_string()));
        }
        if let Some(pos) = self.pos {
            map.insert("Pos".into(), Value::Array(pos.iter().copied().map(float_value).collect()));
        }
        if let Some(rot) = self.rotation {
            map.insert("Rotation".into(), Value::Array(rot.iter().copied().map(float_value).collect()));
        }
        if let EntityDetail::Player { bed_position, spawn, .. } = &self.detail {
            if let Some(p) = bed_position {
                map.insert("BedPos".into(), json!(p));
            }
            if let Some(p) = spawn {
                map.insert("Spawn".into(), json!(p));
            }
        }

        let armor = items_properties(&self.armor, schema, false);
        if !armor.is_empty() {
            map.insert("Armor".into(), Value::Array(armor));
        }

        match &self.detail {
            EntityDetail::Player { inventory, .. } => {
                let inventory = items_properties(inventory, schema, true);
                if !inventory.is_empty() {
                    map.insert("Inventory".into(), Value::Array(inventory));
                }
            }
            EntityDetail::Mob { item_in_hand, item, .. } => {
                if let Some(props) = item_in_hand.as_ref().and_then(|i| i.properties(schema, false)) {
                    map.insert("ItemInHand".into(), Value::Object(props));
                }
                if let Some(props) = item.as_ref().and_then(|i| i.properties(schema, false)) {
                    map.insert("Item".into(), Value::Object(props));
                }
            }
        }

        for (k, v) in self.sorted_other() {
            map.insert(k, json!(v));
        }
        map.insert("Entity".into(), json!("true"));
        map
    }
}

fn push_item_run(s: &mut String, label: &str, items: &[Item], schema: &Schema) {
    if items.is_empty() {
        return;
    }
    s.push_str(&format!(" [{label}:"));
    for item in items.iter().filter(|i| !i.is_empty()) {
        s.push(' ');
        s.push_str(&item.describe(schema));
    }
    s.push(']');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{ChunkBounds, WorldBounds};

    fn floats(v: &[f32]) -> Tag {
        Tag::List(TagList::from_items(v.iter().map(|f| Tag::Float(*f)).collect()).unwrap())
    }

    fn item(id: i16, count: i8) -> Tag {
        Tag::Compound(
            Compound::new()
                .with("Count", Tag::Byte(count))
                .with("Damage", Tag::Short(0))
                .with("id", Tag::Short(id)),
        )
    }

    fn player() -> Compound {
        Compound::new()
            .with("Armor", Tag::List(TagList::from_items(vec![item(0, 0), item(0x132, 1)]).unwrap()))
            .with("BedPositionX", Tag::Int(10))
            .with("BedPositionY", Tag::Int(64))
            .with("BedPositionZ", Tag::Int(-3))
            .with("DimensionId", Tag::Int(1))
            .with("Inventory", Tag::List(TagList::from_items(vec![item(3, 12), item(0, 0)]).unwrap()))
            .with("Pos", floats(&[1.5, 70.0, -2.25]))
            .with("Rotation", floats(&[90.0, 0.5]))
            .with("SpawnX", Tag::Int(0))
            .with("SpawnY", Tag::Int(64))
            .with("SpawnZ", Tag::Int(0))
            .with("id", Tag::Int(63))
    }

    fn projection() -> Projection {
        let b = ChunkBounds { min_x: -1, max_x: 1, min_z: -1, max_z: 1 };
        Projection::new(&WorldBounds::from_parts(Some(b), Some(b)))
    }

    #[test]
    fn test_player_fields() {
        let e = Entity::from_compound(&player(), EntityOrigin::LocalPlayer);
        assert_eq!(e.pos, Some([1.5, 70.0, -2.25]));
        assert_eq!(e.rotation, Some([90.0, 0.5]));
        assert_eq!(e.armor.len(), 2);
        assert_eq!(e.effective_dimension(0), 1);
        match &e.detail {
            EntityDetail::Player { bed_position, spawn, inventory, .. } => {
                assert_eq!(*bed_position, Some([10, 64, -3]));
                assert_eq!(*spawn, Some([0, 64, 0]));
                assert_eq!(inventory.len(), 2);
            }
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn test_partial_bed_position_is_absent() {
        let c = Compound::new().with("BedPositionX", Tag::Int(1)).with("BedPositionY", Tag::Int(2));
        let e = Entity::from_compound(&c, EntityOrigin::RemotePlayer);
        assert!(matches!(e.detail, EntityDetail::Player { bed_position: None, .. }));
        assert_eq!(e.effective_dimension(0), 0);
    }

    #[test]
    fn test_short_pos_list_is_ignored() {
        let c = Compound::new().with("Pos", floats(&[1.0, 2.0])).with("Rotation", floats(&[1.0]));
        let e = Entity::from_compound(&c, EntityOrigin::Mob);
        assert_eq!(e.pos, None);
        assert_eq!(e.rotation, None);
    }

    #[test]
    fn test_other_props() {
        let c = Compound::new()
            .with("Sheared", Tag::Byte(1))
            .with("Age", Tag::Int(-24000))
            .with("Health", Tag::Short(20))
            .with("Owner", Tag::Long(255))
            .with("OwnerNew", Tag::Float(0.5))
            .with("HurtBy", Tag::String("zombie".into()))
            .with("Color", Tag::ByteArray(vec![1]))
            .with("Unrelated", Tag::Int(4));
        let e = Entity::from_compound(&c, EntityOrigin::Mob);
        assert_eq!(
            e.other,
            vec![
                ("Sheared".to_string(), "1 (0x1)".to_string()),
                ("Owner".to_string(), "255 (0xff)".to_string()),
                ("OwnerNew".to_string(), "0.500000".to_string()),
                ("Age".to_string(), "-24000 (0xffffa240)".to_string()),
                ("HurtBy".to_string(), "zombie".to_string()),
                ("Health".to_string(), "20 (0x14)".to_string()),
            ]
        );
        let sorted: Vec<String> = e.sorted_other().into_iter().map(|(k, _)| k).collect();
        assert_eq!(sorted, ["Age", "Health", "HurtBy", "Owner", "OwnerNew", "Sheared"]);
    }

    #[test]
    fn test_mob_details() {
        let c = Compound::new()
            .with("ItemInHand", item(0x100, 1))
            .with("Tile", Tag::Byte(12))
            .with("Pos", floats(&[0.0, 64.0, 0.0]))
            .with("id", Tag::Int(32));
        let schema = Schema::builtin().unwrap();
        let e = Entity::from_compound(&c, EntityOrigin::Mob);
        let text = e.describe(&schema, &projection(), 0);
        assert!(text.starts_with("[Mob Name=Zombie Pos=(0, 64, 0 @ image 16, 16)"), "{text}");
        assert!(text.contains(" ItemInHand=[Item:Iron Shovel Damage=0 Count=1]"), "{text}");
        assert!(text.ends_with(" Tile=[Sand (12 0xc)]]"), "{text}");
    }

    #[test]
    fn test_player_describe() {
        let schema = Schema::builtin().unwrap();
        let e = Entity::from_compound(&player(), EntityOrigin::LocalPlayer);
        let text = e.describe(&schema, &projection(), 1);
        assert!(text.starts_with("[Player Name=The Player Dimension=1 Pos=(1.5, 70, -2.25 @ image 17, 13)"), "{text}");
        assert!(text.contains(" BedPos=(10, 64, -3 @ image 26, 13)"), "{text}");
        assert!(text.contains(" [Armor: [Item:Iron Helmet Damage=0 Count=1]]"), "{text}");
        assert!(text.contains(" [Inventory: [Block:Dirt Damage=0 Count=12]]"), "{text}");
    }

    #[test]
    fn test_player_properties() {
        let schema = Schema::builtin().unwrap();
        let e = Entity::from_compound(&player(), EntityOrigin::LocalPlayer);
        let props = e.properties(&schema, 1);
        let keys: Vec<&str> = props.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["Name", "id", "player", "Dimension", "Pos", "Rotation", "BedPos", "Spawn", "Armor", "Inventory", "Entity"]
        );
        assert_eq!(props["Pos"], json!([1.5, 70.0, -2.25]));
        assert_eq!(props["BedPos"], json!([10, 64, -3]));
        assert_eq!(props["Armor"], json!([{ "Name": "Iron Helmet" }]));
        assert_eq!(props["Inventory"], json!([{ "Name": "Dirt", "Count": "12" }]));
        assert_eq!(props["Dimension"], json!("1"));
        assert_eq!(props["Entity"], json!("true"));
    }

    #[test]
    fn test_unknown_entity_name() {
        let schema = Schema::builtin().unwrap();
        let e = Entity::from_compound(&Compound::new().with("id", Tag::Int(0x7777)), EntityOrigin::Mob);
        assert_eq!(e.name(&schema), None);
        let props = e.properties(&schema, 0);
        assert_eq!(props["Name"], json!("*UNKNOWN: id=30583 0x7777"));
        assert!(!props.contains_key("player"));
        assert!(!props.contains_key("Pos"));
    }
}
