use mcpe_nbt::Compound;
use serde_json::{json, Map, Value};

use crate::schema::Schema;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enchantment {
    pub id: Option<i16>,
    pub level: Option<i16>,
}

impl Enchantment {
    pub fn from_compound(c: &Compound) -> Self {
        Self { id: c.get_short("id"), level: c.get_short("lvl") }
    }

    /// `"<name> (<level>)"`, or `None` when the id is missing
    pub fn display(&self, schema: &Schema) -> Option<String> {
        let id = self.id? as i32;
        let name = match schema.enchantment_name(id) {
            Some(name) => name.to_string(),
            None => format!("(UNKNOWN: id={id} 0x{id:x})"),
        };
        Some(format!("{name} ({})", self.level.unwrap_or(0)))
    }
}

/// An inventory, armor or held item stack
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    pub id: Option<i16>,
    pub damage: Option<i16>,
    pub count: Option<i8>,
    pub slot: Option<i8>,
    pub repair_cost: Option<i32>,
    pub enchantments: Vec<Enchantment>,
}

impl Item {
    pub fn from_compound(c: &Compound) -> Self {
        let mut item = Self {
            id: c.get_short("id"),
            damage: c.get_short("Damage"),
            count: c.get_byte("Count"),
            slot: c.get_byte("Slot"),
            ..Default::default()
        };
        if let Some(tag) = c.get_compound("tag") {
            item.repair_cost = tag.get_int("RepairCost");
            if let Some(list) = tag.get_list("ench") {
                item.enchantments = list.compounds().map(Enchantment::from_compound).collect();
            }
        }
        item
    }

    /// Every compound element of a list, in order
    pub fn list_from(list: Option<&mcpe_nbt::TagList>) -> Vec<Item> {
        list.map(|l| l.compounds().map(Item::from_compound).collect())
            .unwrap_or_default()
    }

    /// Empty slots (id 0, or no id at all) are left out of reports
    pub fn is_empty(&self) -> bool {
        matches!(self.id, None | Some(0))
    }

    pub fn name(&self, schema: &Schema) -> String {
        match self.id {
            Some(id) => schema.item_display_name(id as i32, self.damage.unwrap_or(0)),
            None => "(no id)".to_string(),
        }
    }

    pub fn describe(&self, schema: &Schema) -> String {
        let mut s = String::from("[");
        match self.id {
            Some(id) if (0..=255).contains(&id) => {
                s.push_str("Block:");
                s.push_str(schema.block_name(id as u8, (self.damage.unwrap_or(0) & 0x0f) as u8));
            }
            Some(id) => match schema.item_name(id as i32) {
                Some(name) => {
                    s.push_str("Item:");
                    s.push_str(name);
                }
                None => s.push_str(&format!("(UNKNOWN: id={id} 0x{id:x})")),
            },
            None => s.push_str("(no id)"),
        }
        if let Some(damage) = self.damage {
            s.push_str(&format!(" Damage={damage}"));
        }
        if let Some(count) = self.count {
            s.push_str(&format!(" Count={count}"));
        }
        if let Some(slot) = self.slot {
            s.push_str(&format!(" Slot={slot}"));
        }
        if !self.enchantments.is_empty() {
            let names: Vec<String> = self
                .enchantments
                .iter()
                .map(|e| e.display(schema).unwrap_or_else(|| "*Invalid id*".to_string()))
                .collect();
            s.push_str(&format!(" Enchantments=[{}]", names.join("; ")));
        }
        s.push(']');
        s
    }

    /// Feature properties; `None` for empty slots
    pub fn properties(&self, schema: &Schema, with_count: bool) -> Option<Map<String, Value>> {
        if self.is_empty() {
            return None;
        }
        let mut map = Map::new();
        map.insert("Name".into(), json!(self.name(schema)));
        if with_count {
            if let Some(count) = self.count {
                map.insert("Count".into(), json!(count.to_string()));
            }
        }
        if !self.enchantments.is_empty() {
            let list: Vec<Value> = self
                .enchantments
                .iter()
                .map(|e| match e.display(schema) {
                    Some(name) => json!({ "Name": name }),
                    None => json!({ "valid": "false" }),
                })
                .collect();
            map.insert("Enchantments".into(), Value::Array(list));
        }
        Some(map)
    }
}

/// Property list for a run of items, skipping empty slots
pub fn items_properties(items: &[Item], schema: &Schema, with_count: bool) -> Vec<Value> {
    items
        .iter()
        .filter_map(|i| i.properties(schema, with_count))
        .map(Value::Object)
        .collect()
}

/// Log form for a run of items, skipping empty slots
pub fn describe_items(items: &[Item], schema: &Schema) -> String {
    items
        .iter()
        .filter(|i| !i.is_empty())
        .map(|i| i.describe(schema))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpe_nbt::{Tag, TagList};

    fn sword() -> Compound {
        let ench = Compound::new()
            .with("id", Tag::Short(9))
            .with("lvl", Tag::Short(3));
        let tag = Compound::new()
            .with("RepairCost", Tag::Int(2))
            .with("ench", Tag::List(TagList::from_items(vec![Tag::Compound(ench)]).unwrap()));
        Compound::new()
            .with("Count", Tag::Byte(1))
            .with("Damage", Tag::Short(12))
            .with("Slot", Tag::Byte(4))
            .with("id", Tag::Short(0x114))
            .with("tag", Tag::Compound(tag))
    }

    #[test]
    fn test_from_compound() {
        let item = Item::from_compound(&sword());
        assert_eq!(item.id, Some(0x114));
        assert_eq!(item.damage, Some(12));
        assert_eq!(item.count, Some(1));
        assert_eq!(item.slot, Some(4));
        assert_eq!(item.repair_cost, Some(2));
        assert_eq!(item.enchantments, vec![Enchantment { id: Some(9), level: Some(3) }]);
    }

    #[test]
    fn test_plain_stack() {
        let c = Compound::new()
            .with("Count", Tag::Byte(3))
            .with("id", Tag::Short(5));
        let item = Item::from_compound(&c);
        assert_eq!(item.count, Some(3));
        assert_eq!(item.id, Some(5));
        assert_eq!(item.repair_cost, None);
        assert!(item.enchantments.is_empty());
    }

    #[test]
    fn test_block_item_uses_variant_name() {
        let schema = Schema::builtin().unwrap();
        let c = Compound::new()
            .with("Count", Tag::Byte(8))
            .with("Damage", Tag::Short(5))
            .with("id", Tag::Short(1));
        let item = Item::from_compound(&c);
        assert_eq!(item.name(&schema), "Andesite");
        assert!(item.describe(&schema).starts_with("[Block:Andesite"));
    }

    #[test]
    fn test_wrong_kinds_are_ignored() {
        let c = Compound::new()
            .with("Count", Tag::Int(5))
            .with("id", Tag::Short(3));
        let item = Item::from_compound(&c);
        assert_eq!(item.count, None);
        assert_eq!(item.id, Some(3));
    }

    #[test]
    fn test_properties() {
        let schema = Schema::builtin().unwrap();
        let item = Item::from_compound(&sword());
        let props = Value::Object(item.properties(&schema, true).unwrap());
        assert_eq!(
            props,
            json!({
                "Name": "Diamond Sword",
                "Count": "1",
                "Enchantments": [{ "Name": "Sharpness (3)" }]
            })
        );
        let props = item.properties(&schema, false).unwrap();
        assert!(!props.contains_key("Count"));
    }

    #[test]
    fn test_air_is_swallowed() {
        let schema = Schema::builtin().unwrap();
        let air = Item::from_compound(&Compound::new().with("id", Tag::Short(0)).with("Count", Tag::Byte(0)));
        assert!(air.properties(&schema, true).is_none());
        let items = vec![air, Item::from_compound(&sword())];
        assert_eq!(items_properties(&items, &schema, true).len(), 1);
    }

    #[test]
    fn test_describe() {
        let schema = Schema::builtin().unwrap();
        let item = Item::from_compound(&sword());
        assert_eq!(
            item.describe(&schema),
            "[Item:Diamond Sword Damage=12 Count=1 Slot=4 Enchantments=[Sharpness (3)]]"
        );
        let dirt = Item::from_compound(&Compound::new().with("id", Tag::Short(3)));
        assert_eq!(dirt.describe(&schema), "[Block:Dirt]");
    }
}
