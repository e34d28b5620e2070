use std::{
    io::{Read, Write},
    sync::LazyLock,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Quat, Vec3};

use crate::{
    error::Result,
    read_ext::MyReadBytesExt,
    record::{RecordBody, Registry, TaggedRecord},
    text::TextEncoding,
    write_ext::MyWriteBytesExt,
};

static REGISTRY: LazyLock<Registry<MapBlock>> = LazyLock::new(|| {
    let mut registry = Registry::new("map block");
    registry
        .register(MapBlock::DECORATION, "decoration", || {
            MapBlock::Decoration(ObjectPlacement::default())
        })
        .register(MapBlock::BUILDING, "building", || {
            MapBlock::Building(ObjectPlacement::default())
        })
        .register(MapBlock::SOUND, "sound", || {
            MapBlock::Sound(SoundEmitter::default())
        })
        .register(MapBlock::EFFECT, "effect", || {
            MapBlock::Effect(EffectEmitter::default())
        })
        .register(MapBlock::WARP, "warp", || {
            MapBlock::Warp(WarpGate::default())
        })
        .register(MapBlock::EVENT, "event", || {
            MapBlock::Event(EventObject::default())
        });
    registry
});

pub fn registry() -> &'static Registry<MapBlock> {
    &REGISTRY
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapBlock {
    Decoration(ObjectPlacement),
    Building(ObjectPlacement),
    Sound(SoundEmitter),
    Effect(EffectEmitter),
    Warp(WarpGate),
    Event(EventObject),
}

impl MapBlock {
    pub const DECORATION: i32 = 1;
    pub const BUILDING: i32 = 3;
    pub const SOUND: i32 = 4;
    pub const EFFECT: i32 = 5;
    pub const WARP: i32 = 10;
    pub const EVENT: i32 = 12;
}

impl TaggedRecord for MapBlock {
    fn tag(&self) -> i32 {
        match self {
            MapBlock::Decoration(_) => MapBlock::DECORATION,
            MapBlock::Building(_) => MapBlock::BUILDING,
            MapBlock::Sound(_) => MapBlock::SOUND,
            MapBlock::Effect(_) => MapBlock::EFFECT,
            MapBlock::Warp(_) => MapBlock::WARP,
            MapBlock::Event(_) => MapBlock::EVENT,
        }
    }

    fn body(&self) -> &dyn RecordBody {
        match self {
            MapBlock::Decoration(v) | MapBlock::Building(v) => v,
            MapBlock::Sound(v) => v,
            MapBlock::Effect(v) => v,
            MapBlock::Warp(v) => v,
            MapBlock::Event(v) => v,
        }
    }

    fn body_mut(&mut self) -> &mut dyn RecordBody {
        match self {
            MapBlock::Decoration(v) | MapBlock::Building(v) => v,
            MapBlock::Sound(v) => v,
            MapBlock::Effect(v) => v,
            MapBlock::Warp(v) => v,
            MapBlock::Event(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPlacement {
    pub object_id: i32,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for ObjectPlacement {
    fn default() -> Self {
        ObjectPlacement {
            object_id: 0,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl RecordBody for ObjectPlacement {
    fn read_body(&mut self, reader: &mut dyn Read, _text: TextEncoding) -> Result<()> {
        self.object_id = reader.read_i32::<LittleEndian>()?;
        self.position = reader.read_vec3()?;
        self.rotation = reader.read_quat()?;
        self.scale = reader.read_vec3()?;
        Ok(())
    }

    fn write_body(&self, writer: &mut dyn Write, _text: TextEncoding) -> Result<()> {
        writer.write_i32::<LittleEndian>(self.object_id)?;
        writer.write_vec3(self.position)?;
        writer.write_quat(self.rotation)?;
        writer.write_vec3(self.scale)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoundEmitter {
    pub path: String,
    pub position: Vec3,
    pub range: i32,
    pub interval: i32,
}

impl RecordBody for SoundEmitter {
    fn read_body(&mut self, reader: &mut dyn Read, text: TextEncoding) -> Result<()> {
        self.path = reader.read_nul_string(text)?;
        self.position = reader.read_vec3()?;
        self.range = reader.read_i32::<LittleEndian>()?;
        self.interval = reader.read_i32::<LittleEndian>()?;
        Ok(())
    }

    fn write_body(&self, writer: &mut dyn Write, text: TextEncoding) -> Result<()> {
        writer.write_nul_string(&self.path, text)?;
        writer.write_vec3(self.position)?;
        writer.write_i32::<LittleEndian>(self.range)?;
        writer.write_i32::<LittleEndian>(self.interval)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectEmitter {
    pub path: String,
    pub position: Vec3,
}

impl RecordBody for EffectEmitter {
    fn read_body(&mut self, reader: &mut dyn Read, text: TextEncoding) -> Result<()> {
        self.path = reader.read_nul_string(text)?;
        self.position = reader.read_vec3()?;
        Ok(())
    }

    fn write_body(&self, writer: &mut dyn Write, text: TextEncoding) -> Result<()> {
        writer.write_nul_string(&self.path, text)?;
        writer.write_vec3(self.position)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarpGate {
    pub target_zone: i32,
    pub position: Vec3,
}

impl RecordBody for WarpGate {
    fn read_body(&mut self, reader: &mut dyn Read, _text: TextEncoding) -> Result<()> {
        self.target_zone = reader.read_i32::<LittleEndian>()?;
        self.position = reader.read_vec3()?;
        Ok(())
    }

    fn write_body(&self, writer: &mut dyn Write, _text: TextEncoding) -> Result<()> {
        writer.write_i32::<LittleEndian>(self.target_zone)?;
        writer.write_vec3(self.position)
    }
}

/// A scripted object the player can interact with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventObject {
    pub name: String,
    pub script: String,
    pub position: Vec3,
}

impl RecordBody for EventObject {
    fn read_body(&mut self, reader: &mut dyn Read, text: TextEncoding) -> Result<()> {
        self.name = reader.read_length_string(text)?;
        self.script = reader.read_length_string(text)?;
        self.position = reader.read_vec3()?;
        Ok(())
    }

    fn write_body(&self, writer: &mut dyn Write, text: TextEncoding) -> Result<()> {
        writer.write_length_string(&self.name, text)?;
        writer.write_length_string(&self.script, text)?;
        writer.write_vec3(self.position)
    }
}
