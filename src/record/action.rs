use std::{
    io::{Read, Write},
    sync::LazyLock,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::Vec3;

use crate::{
    error::{Error, Result},
    read_ext::MyReadBytesExt,
    record::{RecordBody, Registry, TaggedRecord},
    text::TextEncoding,
    write_ext::MyWriteBytesExt,
};

static REGISTRY: LazyLock<Registry<Action>> = LazyLock::new(|| {
    let mut registry = Registry::new("action");
    registry
        .register(Action::SAY, "say", || Action::Say(Say::default()))
        .register(Action::MOVE, "move", || Action::Move(Move::default()))
        .register(Action::SPAWN_MONSTER, "spawn_monster", || {
            Action::SpawnMonster(SpawnMonster::default())
        })
        .register(Action::SET_VARIABLE, "set_variable", || {
            Action::SetVariable(SetVariable::default())
        })
        .register(Action::PLAY_EFFECT, "play_effect", || {
            Action::PlayEffect(PlayEffect::default())
        });
    registry
});

pub fn registry() -> &'static Registry<Action> {
    &REGISTRY
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Say(Say),
    Move(Move),
    SpawnMonster(SpawnMonster),
    SetVariable(SetVariable),
    PlayEffect(PlayEffect),
}

impl Action {
    pub const SAY: i32 = 1;
    pub const MOVE: i32 = 2;
    pub const SPAWN_MONSTER: i32 = 3;
    pub const SET_VARIABLE: i32 = 4;
    pub const PLAY_EFFECT: i32 = 5;
}

impl TaggedRecord for Action {
    fn tag(&self) -> i32 {
        match self {
            Action::Say(_) => Action::SAY,
            Action::Move(_) => Action::MOVE,
            Action::SpawnMonster(_) => Action::SPAWN_MONSTER,
            Action::SetVariable(_) => Action::SET_VARIABLE,
            Action::PlayEffect(_) => Action::PLAY_EFFECT,
        }
    }

    fn body(&self) -> &dyn RecordBody {
        match self {
            Action::Say(v) => v,
            Action::Move(v) => v,
            Action::SpawnMonster(v) => v,
            Action::SetVariable(v) => v,
            Action::PlayEffect(v) => v,
        }
    }

    fn body_mut(&mut self) -> &mut dyn RecordBody {
        match self {
            Action::Say(v) => v,
            Action::Move(v) => v,
            Action::SpawnMonster(v) => v,
            Action::SetVariable(v) => v,
            Action::PlayEffect(v) => v,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Say {
    pub message: String,
}

impl RecordBody for Say {
    fn read_body(&mut self, reader: &mut dyn Read, text: TextEncoding) -> Result<()> {
        self.message = reader.read_length_string(text)?;
        Ok(())
    }

    fn write_body(&self, writer: &mut dyn Write, text: TextEncoding) -> Result<()> {
        writer.write_length_string(&self.message, text)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Move {
    pub destination: Vec3,
    pub speed: f32,
}

impl RecordBody for Move {
    fn read_body(&mut self, reader: &mut dyn Read, _text: TextEncoding) -> Result<()> {
        self.destination = reader.read_vec3()?;
        self.speed = reader.read_f32::<LittleEndian>()?;
        Ok(())
    }

    fn write_body(&self, writer: &mut dyn Write, _text: TextEncoding) -> Result<()> {
        writer.write_vec3(self.destination)?;
        writer.write_f32::<LittleEndian>(self.speed)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnMonster {
    pub monster_id: i32,
    pub count: i32,
    pub range: f32,
}

impl RecordBody for SpawnMonster {
    fn read_body(&mut self, reader: &mut dyn Read, _text: TextEncoding) -> Result<()> {
        self.monster_id = reader.read_i32::<LittleEndian>()?;
        self.count = reader.read_i32::<LittleEndian>()?;
        self.range = reader.read_f32::<LittleEndian>()?;
        Ok(())
    }

    fn write_body(&self, writer: &mut dyn Write, _text: TextEncoding) -> Result<()> {
        writer.write_i32::<LittleEndian>(self.monster_id)?;
        writer.write_i32::<LittleEndian>(self.count)?;
        writer.write_f32::<LittleEndian>(self.range)?;
        Ok(())
    }
}

#[repr(u8)]
#[derive(strum::FromRepr, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VariableOp {
    #[default]
    Set,
    Add,
    Subtract,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetVariable {
    pub index: i32,
    pub op: VariableOp,
    pub value: i32,
}

impl RecordBody for SetVariable {
    fn read_body(&mut self, reader: &mut dyn Read, _text: TextEncoding) -> Result<()> {
        self.index = reader.read_i32::<LittleEndian>()?;
        let op = reader.read_u8()?;
        self.op = VariableOp::from_repr(op).ok_or(Error::InvalidValue {
            what: "variable op",
            value: op as i64,
        })?;
        self.value = reader.read_i32::<LittleEndian>()?;
        Ok(())
    }

    fn write_body(&self, writer: &mut dyn Write, _text: TextEncoding) -> Result<()> {
        writer.write_i32::<LittleEndian>(self.index)?;
        writer.write_u8(self.op as u8)?;
        writer.write_i32::<LittleEndian>(self.value)?;
        Ok(())
    }
}

/// Plays an effect attached to one of the owner's bones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayEffect {
    pub effect_path: String,
    pub bone: i32,
}

impl RecordBody for PlayEffect {
    fn read_body(&mut self, reader: &mut dyn Read, text: TextEncoding) -> Result<()> {
        self.effect_path = reader.read_nul_string(text)?;
        self.bone = reader.read_i32::<LittleEndian>()?;
        Ok(())
    }

    fn write_body(&self, writer: &mut dyn Write, text: TextEncoding) -> Result<()> {
        writer.write_nul_string(&self.effect_path, text)?;
        writer.write_i32::<LittleEndian>(self.bone)?;
        Ok(())
    }
}
