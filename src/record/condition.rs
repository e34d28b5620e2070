use std::{
    io::{Read, Write},
    sync::LazyLock,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    error::{Error, Result},
    record::{RecordBody, Registry, TaggedRecord},
    text::TextEncoding,
};

static REGISTRY: LazyLock<Registry<Condition>> = LazyLock::new(|| {
    let mut registry = Registry::new("condition");
    registry
        .register(Condition::HEALTH, "health", || {
            Condition::Health(Health::default())
        })
        .register(Condition::DISTANCE, "distance", || {
            Condition::Distance(Distance::default())
        })
        .register(Condition::VARIABLE, "variable", || {
            Condition::Variable(Variable::default())
        })
        .register(Condition::RANDOM, "random", || {
            Condition::Random(Random::default())
        });
    registry
});

pub fn registry() -> &'static Registry<Condition> {
    &REGISTRY
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Health(Health),
    Distance(Distance),
    Variable(Variable),
    Random(Random),
}

impl Condition {
    pub const HEALTH: i32 = 1;
    pub const DISTANCE: i32 = 2;
    pub const VARIABLE: i32 = 3;
    pub const RANDOM: i32 = 4;
}

impl TaggedRecord for Condition {
    fn tag(&self) -> i32 {
        match self {
            Condition::Health(_) => Condition::HEALTH,
            Condition::Distance(_) => Condition::DISTANCE,
            Condition::Variable(_) => Condition::VARIABLE,
            Condition::Random(_) => Condition::RANDOM,
        }
    }

    fn body(&self) -> &dyn RecordBody {
        match self {
            Condition::Health(v) => v,
            Condition::Distance(v) => v,
            Condition::Variable(v) => v,
            Condition::Random(v) => v,
        }
    }

    fn body_mut(&mut self) -> &mut dyn RecordBody {
        match self {
            Condition::Health(v) => v,
            Condition::Distance(v) => v,
            Condition::Variable(v) => v,
            Condition::Random(v) => v,
        }
    }
}

#[repr(u8)]
#[derive(strum::FromRepr, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompareOp {
    #[default]
    Equal,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    NotEqual,
}

impl CompareOp {
    pub fn read(reader: &mut dyn Read) -> Result<Self> {
        let value = reader.read_u8()?;
        CompareOp::from_repr(value).ok_or(Error::InvalidValue {
            what: "compare op",
            value: value as i64,
        })
    }

    pub fn write(self, writer: &mut dyn Write) -> Result<()> {
        writer.write_u8(self as u8)?;
        Ok(())
    }
}

/// Compares the owner's remaining health, in percent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Health {
    pub percent: i32,
    pub op: CompareOp,
}

impl RecordBody for Health {
    fn read_body(&mut self, reader: &mut dyn Read, _text: TextEncoding) -> Result<()> {
        self.percent = reader.read_i32::<LittleEndian>()?;
        self.op = CompareOp::read(reader)?;
        Ok(())
    }

    fn write_body(&self, writer: &mut dyn Write, _text: TextEncoding) -> Result<()> {
        writer.write_i32::<LittleEndian>(self.percent)?;
        self.op.write(writer)
    }
}

/// Compares the distance to the current target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distance {
    pub distance: f32,
    pub op: CompareOp,
}

impl RecordBody for Distance {
    fn read_body(&mut self, reader: &mut dyn Read, _text: TextEncoding) -> Result<()> {
        self.distance = reader.read_f32::<LittleEndian>()?;
        self.op = CompareOp::read(reader)?;
        Ok(())
    }

    fn write_body(&self, writer: &mut dyn Write, _text: TextEncoding) -> Result<()> {
        writer.write_f32::<LittleEndian>(self.distance)?;
        self.op.write(writer)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variable {
    pub index: i32,
    pub op: CompareOp,
    pub value: i32,
}

impl RecordBody for Variable {
    fn read_body(&mut self, reader: &mut dyn Read, _text: TextEncoding) -> Result<()> {
        self.index = reader.read_i32::<LittleEndian>()?;
        self.op = CompareOp::read(reader)?;
        self.value = reader.read_i32::<LittleEndian>()?;
        Ok(())
    }

    fn write_body(&self, writer: &mut dyn Write, _text: TextEncoding) -> Result<()> {
        writer.write_i32::<LittleEndian>(self.index)?;
        self.op.write(writer)?;
        writer.write_i32::<LittleEndian>(self.value)?;
        Ok(())
    }
}

/// Passes with probability `chance` in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Random {
    pub chance: f32,
}

impl RecordBody for Random {
    fn read_body(&mut self, reader: &mut dyn Read, _text: TextEncoding) -> Result<()> {
        self.chance = reader.read_f32::<LittleEndian>()?;
        Ok(())
    }

    fn write_body(&self, writer: &mut dyn Write, _text: TextEncoding) -> Result<()> {
        writer.write_f32::<LittleEndian>(self.chance)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::record::{decode_container, encode_container};

    #[test]
    fn conditions_round_trip() {
        let conditions = vec![
            Condition::Health(Health {
                percent: 30,
                op: CompareOp::LessEqual,
            }),
            Condition::Distance(Distance {
                distance: 150.0,
                op: CompareOp::Greater,
            }),
            Condition::Variable(Variable {
                index: 4,
                op: CompareOp::NotEqual,
                value: -1,
            }),
            Condition::Random(Random { chance: 0.25 }),
        ];

        let mut bytes = Vec::new();
        encode_container(&mut bytes, registry(), &conditions, TextEncoding::default()).unwrap();
        let decoded =
            decode_container(&mut Cursor::new(bytes), registry(), TextEncoding::default())
                .unwrap();
        assert_eq!(decoded, conditions);
    }

    #[test]
    fn unknown_compare_op_is_invalid() {
        let mut bytes = Vec::new();
        bytes.write_i32::<LittleEndian>(1).unwrap();
        bytes.write_i32::<LittleEndian>(Condition::HEALTH).unwrap();
        bytes.write_i32::<LittleEndian>(50).unwrap();
        bytes.write_u8(17).unwrap();

        let err = decode_container(&mut Cursor::new(bytes), registry(), TextEncoding::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidValue {
                what: "compare op",
                value: 17
            }
        ));
    }
}
