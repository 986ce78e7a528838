//! Block, item, entity, biome and enchantment tables
//!
//! The built-in tables ship as JSON and can be overlaid by a user file with
//! the same shape. Ids and colors accept numbers or `"0x.."` / `"#rrggbb"`
//! strings.

use std::path::Path;

use ahash::AHashMap;
use bitflags::bitflags;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::palette::STANDARD_COLORS;

/// Fallback color for anything the tables do not know
pub const UNKNOWN_COLOR: u32 = 0xff00ff;

const BUILTIN: &str = include_str!("builtin.json");

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BlockFlags: u8 {
        const SOLID = 0x01;
        const OPAQUE = 0x02;
        const LIQUID = 0x04;
        const SPAWNABLE = 0x08;
    }
}

/// A block id paired with one data nibble value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockVariant {
    pub name: String,
    pub color: u32,
    pub spawnable: bool,
}

#[derive(Debug, Clone)]
pub struct BlockInfo {
    pub name: String,
    pub color: u32,
    /// False until a table assigns a color; rendering such a block is counted
    pub color_set: bool,
    pub flags: BlockFlags,
    /// Blocks colored from the dye palette by data nibble carry the palette offset
    pub variant_offset: Option<u8>,
    /// Keyed by data nibble
    pub variants: IndexMap<u8, BlockVariant>,
}

impl Default for BlockInfo {
    fn default() -> Self {
        Self {
            name: "(unknown)".to_string(),
            color: UNKNOWN_COLOR,
            color_set: false,
            flags: BlockFlags::SOLID | BlockFlags::OPAQUE | BlockFlags::SPAWNABLE,
            variant_offset: None,
            variants: IndexMap::new(),
        }
    }
}

impl BlockInfo {
    pub fn is_solid(&self) -> bool {
        self.flags.contains(BlockFlags::SOLID)
    }

    pub fn is_liquid(&self) -> bool {
        self.flags.contains(BlockFlags::LIQUID)
    }

    pub fn variant(&self, data: u8) -> Option<&BlockVariant> {
        self.variants.get(&data)
    }

    /// Variant name when one is listed for `data`, else the block name
    pub fn name_for(&self, data: u8) -> &str {
        self.variant(data).map_or(self.name.as_str(), |v| v.name.as_str())
    }

    pub fn is_spawnable(&self, data: u8) -> bool {
        match self.variant(data) {
            Some(v) => v.spawnable,
            None => self.flags.contains(BlockFlags::SPAWNABLE),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BiomeInfo {
    pub name: String,
    pub color: u32,
    pub color_set: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumOrText {
    Num(i64),
    Text(String),
}

impl NumOrText {
    fn value(&self) -> Result<i64> {
        match self {
            NumOrText::Num(v) => Ok(*v),
            NumOrText::Text(s) => parse_number(s),
        }
    }
}

fn parse_number(s: &str) -> Result<i64> {
    let t = s.trim();
    let parsed = if let Some(hex) = t.strip_prefix('#') {
        i64::from_str_radix(hex, 16)
    } else if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else {
        t.parse()
    };
    parsed.map_err(|_| Error::Schema(format!("bad number: {s:?}")))
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    id: NumOrText,
    name: Option<String>,
    color: Option<NumOrText>,
    solid: Option<bool>,
    opaque: Option<bool>,
    liquid: Option<bool>,
    spawnable: Option<bool>,
    variant_colors: Option<u8>,
    #[serde(default)]
    variants: Vec<RawVariant>,
}

/// `color` plus optional `dcolor`; without a color the parent's is offset by `data`
#[derive(Debug, Deserialize)]
struct RawVariant {
    data: NumOrText,
    name: String,
    color: Option<NumOrText>,
    dcolor: Option<NumOrText>,
    spawnable: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawNamed {
    id: NumOrText,
    name: String,
    color: Option<NumOrText>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSchema {
    #[serde(default)]
    blocks: Vec<RawBlock>,
    #[serde(default)]
    items: Vec<RawNamed>,
    #[serde(default)]
    entities: Vec<RawNamed>,
    #[serde(default)]
    biomes: Vec<RawNamed>,
    #[serde(default)]
    enchantments: Vec<RawNamed>,
}

/// All lookup tables used while decoding and rendering
#[derive(Debug, Clone)]
pub struct Schema {
    blocks: Vec<BlockInfo>,
    items: AHashMap<i32, String>,
    entities: AHashMap<i32, String>,
    biomes: AHashMap<i32, BiomeInfo>,
    enchantments: AHashMap<i32, String>,
    unknown_biome: BiomeInfo,
}

impl Schema {
    /// Tables with no entries; every block is the unknown default
    pub fn empty() -> Self {
        Self {
            blocks: vec![BlockInfo::default(); 256],
            items: AHashMap::new(),
            entities: AHashMap::new(),
            biomes: AHashMap::new(),
            enchantments: AHashMap::new(),
            unknown_biome: BiomeInfo {
                name: "(unknown)".to_string(),
                color: UNKNOWN_COLOR,
                color_set: false,
            },
        }
    }

    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut schema = Self::empty();
        schema.overlay_json(text)?;
        Ok(schema)
    }

    /// Built-in tables with an optional user overlay file on top
    pub fn load(overlay: Option<&Path>) -> Result<Self> {
        let mut schema = Self::builtin()?;
        if let Some(path) = overlay {
            let text = std::fs::read_to_string(path)?;
            schema.overlay_json(&text)?;
            tracing::info!(path = %path.display(), "Loaded schema overlay");
        }
        Ok(schema)
    }

    /// Merge entries from a JSON document; later entries win
    pub fn overlay_json(&mut self, text: &str) -> Result<()> {
        let raw: RawSchema = serde_json::from_str(text)?;

        for b in raw.blocks {
            let id = b.id.value()?;
            let slot = usize::try_from(id)
                .ok()
                .and_then(|i| self.blocks.get_mut(i))
                .ok_or_else(|| Error::Schema(format!("block id out of range: {id}")))?;
            if let Some(name) = b.name {
                slot.name = name;
            }
            if let Some(color) = b.color {
                slot.color = color.value()? as u32 & 0xffffff;
                slot.color_set = true;
            }
            for (flag, value) in [
                (BlockFlags::SOLID, b.solid),
                (BlockFlags::OPAQUE, b.opaque),
                (BlockFlags::LIQUID, b.liquid),
                (BlockFlags::SPAWNABLE, b.spawnable),
            ] {
                if let Some(v) = value {
                    slot.flags.set(flag, v);
                }
            }
            if let Some(offset) = b.variant_colors {
                slot.variant_offset = Some(offset);
            }
            for v in b.variants {
                let data = v.data.value()?;
                let data = u8::try_from(data)
                    .ok()
                    .filter(|d| *d <= 0x0f)
                    .ok_or_else(|| Error::Schema(format!("block {id}: variant data out of range: {data}")))?;
                let color = match v.color {
                    Some(c) => c.value()? + v.dcolor.map(|d| d.value()).transpose()?.unwrap_or(0),
                    None => i64::from(slot.color) + i64::from(data),
                };
                let variant = BlockVariant {
                    name: v.name,
                    color: color as u32 & 0xffffff,
                    spawnable: v.spawnable.unwrap_or(slot.flags.contains(BlockFlags::SPAWNABLE)),
                };
                slot.variants.insert(data, variant);
            }
        }

        for e in raw.items {
            self.items.insert(e.id.value()? as i32, e.name);
        }
        for e in raw.entities {
            self.entities.insert(e.id.value()? as i32, e.name);
        }
        for e in raw.enchantments {
            self.enchantments.insert(e.id.value()? as i32, e.name);
        }
        for e in raw.biomes {
            let (color, color_set) = match e.color {
                Some(c) => (c.value()? as u32 & 0xffffff, true),
                None => (UNKNOWN_COLOR, false),
            };
            self.biomes.insert(e.id.value()? as i32, BiomeInfo { name: e.name, color, color_set });
        }
        Ok(())
    }

    pub fn block(&self, id: u8) -> &BlockInfo {
        &self.blocks[id as usize]
    }

    pub fn is_solid(&self, id: u8) -> bool {
        self.block(id).is_solid()
    }

    /// Render color for a block and whether the tables assigned it
    ///
    /// Dye-palette blocks come first, then a listed variant, then the block.
    pub fn block_color(&self, id: u8, data: u8) -> (u32, bool) {
        let block = self.block(id);
        if let Some(offset) = block.variant_offset {
            return (standard_color(offset.wrapping_add(data)), true);
        }
        match block.variant(data) {
            Some(v) => (v.color, true),
            None => (block.color, block.color_set),
        }
    }

    pub fn block_name(&self, id: u8, data: u8) -> &str {
        self.block(id).name_for(data)
    }

    pub fn biome(&self, id: u8) -> &BiomeInfo {
        self.biomes.get(&(id as i32)).unwrap_or(&self.unknown_biome)
    }

    pub fn biome_color(&self, id: u8) -> u32 {
        self.biome(id).color
    }

    pub fn biome_name(&self, id: u8) -> Option<&str> {
        self.biomes.get(&(id as i32)).map(|b| b.name.as_str())
    }

    pub fn item_name(&self, id: i32) -> Option<&str> {
        self.items.get(&id).map(String::as_str)
    }

    /// Name shown for an item id: block table (with the damage value as
    /// variant) for ids up to 255, then the item table
    pub fn item_display_name(&self, id: i32, damage: i16) -> String {
        if (0..=255).contains(&id) {
            return self.block_name(id as u8, (damage & 0x0f) as u8).to_string();
        }
        match self.item_name(id) {
            Some(name) => name.to_string(),
            None => format!("Unknown:id={id} 0x{id:x}"),
        }
    }

    pub fn entity_name(&self, id: i32) -> Option<&str> {
        self.entities.get(&id).map(String::as_str)
    }

    pub fn enchantment_name(&self, id: i32) -> Option<&str> {
        self.enchantments.get(&id).map(String::as_str)
    }
}

/// Dye palette lookup; indices wrap at sixteen
pub fn standard_color(index: u8) -> u32 {
    STANDARD_COLORS[(index & 0x0f) as usize]
}
