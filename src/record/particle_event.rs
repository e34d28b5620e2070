use std::{
    io::{Read, Write},
    sync::LazyLock,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Vec2, Vec3, Vec4};

use crate::{
    error::Result,
    read_ext::MyReadBytesExt,
    record::{RecordBody, Registry, TaggedRecord},
    text::TextEncoding,
    write_ext::MyWriteBytesExt,
};

static REGISTRY: LazyLock<Registry<ParticleEvent>> = LazyLock::new(|| {
    let mut registry = Registry::new("particle event");
    registry
        .register(ParticleEvent::SIZE, "size", || {
            ParticleEvent::Size(Keyed::default())
        })
        .register(ParticleEvent::TIMER, "timer", || {
            ParticleEvent::Timer(Keyed::default())
        })
        .register(ParticleEvent::COLOR, "color", || {
            ParticleEvent::Color(Keyed::default())
        })
        .register(ParticleEvent::VELOCITY, "velocity", || {
            ParticleEvent::Velocity(Keyed::default())
        })
        .register(ParticleEvent::ROTATION, "rotation", || {
            ParticleEvent::Rotation(Keyed::default())
        })
        .register(ParticleEvent::TEXTURE, "texture", || {
            ParticleEvent::Texture(Keyed::default())
        });
    registry
});

pub fn registry() -> &'static Registry<ParticleEvent> {
    &REGISTRY
}

/// Particle sequence events change one property of a particle between two
/// points of its lifetime.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticleEvent {
    Size(Keyed<Vec2>),
    Timer(Keyed<f32>),
    Color(Keyed<Vec4>),
    Velocity(Keyed<Vec3>),
    Rotation(Keyed<f32>),
    Texture(Keyed<i32>),
}

impl ParticleEvent {
    pub const SIZE: i32 = 1;
    pub const TIMER: i32 = 2;
    pub const COLOR: i32 = 5;
    pub const VELOCITY: i32 = 8;
    pub const ROTATION: i32 = 9;
    pub const TEXTURE: i32 = 10;
}

impl TaggedRecord for ParticleEvent {
    fn tag(&self) -> i32 {
        match self {
            ParticleEvent::Size(_) => ParticleEvent::SIZE,
            ParticleEvent::Timer(_) => ParticleEvent::TIMER,
            ParticleEvent::Color(_) => ParticleEvent::COLOR,
            ParticleEvent::Velocity(_) => ParticleEvent::VELOCITY,
            ParticleEvent::Rotation(_) => ParticleEvent::ROTATION,
            ParticleEvent::Texture(_) => ParticleEvent::TEXTURE,
        }
    }

    fn body(&self) -> &dyn RecordBody {
        match self {
            ParticleEvent::Size(v) => v,
            ParticleEvent::Timer(v) => v,
            ParticleEvent::Color(v) => v,
            ParticleEvent::Velocity(v) => v,
            ParticleEvent::Rotation(v) => v,
            ParticleEvent::Texture(v) => v,
        }
    }

    fn body_mut(&mut self) -> &mut dyn RecordBody {
        match self {
            ParticleEvent::Size(v) => v,
            ParticleEvent::Timer(v) => v,
            ParticleEvent::Color(v) => v,
            ParticleEvent::Velocity(v) => v,
            ParticleEvent::Rotation(v) => v,
            ParticleEvent::Texture(v) => v,
        }
    }
}

/// Payload types a particle event can animate.
pub trait EventValue: Default {
    fn read(reader: &mut dyn Read) -> Result<Self>;
    fn write(&self, writer: &mut dyn Write) -> Result<()>;
}

impl EventValue for f32 {
    fn read(reader: &mut dyn Read) -> Result<Self> {
        Ok(reader.read_f32::<LittleEndian>()?)
    }

    fn write(&self, writer: &mut dyn Write) -> Result<()> {
        writer.write_f32::<LittleEndian>(*self)?;
        Ok(())
    }
}

impl EventValue for i32 {
    fn read(reader: &mut dyn Read) -> Result<Self> {
        Ok(reader.read_i32::<LittleEndian>()?)
    }

    fn write(&self, writer: &mut dyn Write) -> Result<()> {
        writer.write_i32::<LittleEndian>(*self)?;
        Ok(())
    }
}

impl EventValue for Vec2 {
    fn read(reader: &mut dyn Read) -> Result<Self> {
        reader.read_vec2()
    }

    fn write(&self, writer: &mut dyn Write) -> Result<()> {
        writer.write_vec2(*self)
    }
}

impl EventValue for Vec3 {
    fn read(reader: &mut dyn Read) -> Result<Self> {
        reader.read_vec3()
    }

    fn write(&self, writer: &mut dyn Write) -> Result<()> {
        writer.write_vec3(*self)
    }
}

impl EventValue for Vec4 {
    fn read(reader: &mut dyn Read) -> Result<Self> {
        reader.read_vec4()
    }

    fn write(&self, writer: &mut dyn Write) -> Result<()> {
        writer.write_vec4(*self)
    }
}

/// Lifetime range, fade flag and the `from`/`to` values of an event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keyed<T> {
    pub start_time: f32,
    pub end_time: f32,
    pub fade: bool,
    pub from: T,
    pub to: T,
}

impl<T: EventValue> RecordBody for Keyed<T> {
    fn read_body(&mut self, reader: &mut dyn Read, _text: TextEncoding) -> Result<()> {
        self.start_time = reader.read_f32::<LittleEndian>()?;
        self.end_time = reader.read_f32::<LittleEndian>()?;
        self.fade = reader.read_bool()?;
        self.from = T::read(reader)?;
        self.to = T::read(reader)?;
        Ok(())
    }

    fn write_body(&self, writer: &mut dyn Write, _text: TextEncoding) -> Result<()> {
        writer.write_f32::<LittleEndian>(self.start_time)?;
        writer.write_f32::<LittleEndian>(self.end_time)?;
        writer.write_bool(self.fade)?;
        self.from.write(writer)?;
        self.to.write(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::record::{decode_container, encode_container};

    #[test]
    fn events_round_trip() {
        let events = vec![
            ParticleEvent::Size(Keyed {
                start_time: 0.0,
                end_time: 0.5,
                fade: true,
                from: Vec2::splat(10.0),
                to: Vec2::splat(40.0),
            }),
            ParticleEvent::Color(Keyed {
                start_time: 0.25,
                end_time: 1.0,
                fade: true,
                from: Vec4::ONE,
                to: Vec4::new(1.0, 0.5, 0.0, 0.0),
            }),
            ParticleEvent::Velocity(Keyed {
                start_time: 0.0,
                end_time: 0.0,
                fade: false,
                from: Vec3::Z * 3.0,
                to: Vec3::ZERO,
            }),
            ParticleEvent::Texture(Keyed {
                start_time: 0.1,
                end_time: 0.9,
                fade: false,
                from: 0,
                to: 15,
            }),
        ];

        let mut bytes = Vec::new();
        encode_container(&mut bytes, registry(), &events, TextEncoding::default()).unwrap();
        let decoded =
            decode_container(&mut Cursor::new(bytes), registry(), TextEncoding::default())
                .unwrap();
        assert_eq!(decoded, events);
    }

    #[test]
    fn rotation_event_layout() {
        let mut bytes = Vec::new();
        let event = ParticleEvent::Rotation(Keyed {
            start_time: 0.0,
            end_time: 1.0,
            fade: true,
            from: 0.0,
            to: 360.0,
        });
        encode_container(&mut bytes, registry(), &[event], TextEncoding::default()).unwrap();

        // count, tag, two times, fade flag, two f32 values
        assert_eq!(bytes.len(), 4 + 4 + 8 + 1 + 8);
        assert_eq!(&bytes[4..8], &ParticleEvent::ROTATION.to_le_bytes());
    }
}
