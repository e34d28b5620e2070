use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use glam::{Quat, Vec2, Vec3, Vec4};

use crate::{
    error::{Error, Result},
    text::TextEncoding,
};

pub trait MyWriteBytesExt: Write {
    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)?;
        Ok(())
    }

    fn write_vec2(&mut self, v: Vec2) -> Result<()> {
        self.write_f32::<LittleEndian>(v.x)?;
        self.write_f32::<LittleEndian>(v.y)?;
        Ok(())
    }

    fn write_vec3(&mut self, v: Vec3) -> Result<()> {
        self.write_f32::<LittleEndian>(v.x)?;
        self.write_f32::<LittleEndian>(v.y)?;
        self.write_f32::<LittleEndian>(v.z)?;
        Ok(())
    }

    fn write_vec4(&mut self, v: Vec4) -> Result<()> {
        self.write_f32::<LittleEndian>(v.x)?;
        self.write_f32::<LittleEndian>(v.y)?;
        self.write_f32::<LittleEndian>(v.z)?;
        self.write_f32::<LittleEndian>(v.w)?;
        Ok(())
    }

    fn write_quat(&mut self, q: Quat) -> Result<()> {
        self.write_f32::<LittleEndian>(q.w)?;
        self.write_f32::<LittleEndian>(q.x)?;
        self.write_f32::<LittleEndian>(q.y)?;
        self.write_f32::<LittleEndian>(q.z)?;
        Ok(())
    }

    fn write_length_string(&mut self, value: &str, text: TextEncoding) -> Result<()> {
        let bytes = text.encode(value)?;
        let len = u16::try_from(bytes.len()).map_err(|_| Error::InvalidCount {
            what: "string byte",
            count: bytes.len() as i64,
        })?;
        self.write_u16::<LittleEndian>(len)?;
        self.write_all(&bytes)?;
        Ok(())
    }

    fn write_nul_string(&mut self, value: &str, text: TextEncoding) -> Result<()> {
        let bytes = text.encode(value)?;
        if bytes.contains(&0) {
            return Err(Error::Unencodable(value.to_string(), "a nul-terminated string"));
        }
        self.write_all(&bytes)?;
        self.write_u8(0)?;
        Ok(())
    }

    /// Writes a count as the i32 the formats store on disk.
    fn write_count(&mut self, what: &'static str, count: usize) -> Result<()> {
        let count = i32::try_from(count).map_err(|_| Error::InvalidCount {
            what,
            count: count as i64,
        })?;
        self.write_i32::<LittleEndian>(count)?;
        Ok(())
    }

    /// Writes a count stored on disk as a u32.
    fn write_u32_count(&mut self, what: &'static str, count: usize) -> Result<()> {
        let count = u32::try_from(count).map_err(|_| Error::InvalidCount {
            what,
            count: count as i64,
        })?;
        self.write_u32::<LittleEndian>(count)?;
        Ok(())
    }
}

impl<W: Write + ?Sized> MyWriteBytesExt for W {}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::read_ext::MyReadBytesExt;

    use super::*;

    #[test]
    fn quat_is_written_w_first() {
        let mut bytes = Vec::new();
        bytes.write_quat(Quat::from_xyzw(2.0, 3.0, 4.0, 1.0)).unwrap();
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[12..16], &4.0f32.to_le_bytes());
    }

    #[test]
    fn korean_names_survive() {
        let text = TextEncoding::euc_kr();
        let mut bytes = Vec::new();
        bytes.write_length_string("머리", text).unwrap();
        bytes.write_nul_string("꼬리", text).unwrap();
        assert_eq!(bytes.len(), 2 + 4 + 4 + 1);

        let mut cursor = Cursor::new(bytes);
        assert_eq!(cursor.read_length_string(text).unwrap(), "머리");
        assert_eq!(cursor.read_nul_string(text).unwrap(), "꼬리");
    }

    #[test]
    fn interior_nul_is_rejected() {
        let mut bytes = Vec::new();
        let err = bytes
            .write_nul_string("a\0b", TextEncoding::default())
            .unwrap_err();
        assert!(matches!(err, Error::Unencodable(..)));
    }

    #[test]
    fn counts_that_do_not_fit_are_rejected() {
        let mut bytes = Vec::new();
        bytes.write_u32_count("bone", 3).unwrap();
        assert_eq!(bytes, 3u32.to_le_bytes());

        let err = bytes
            .write_count("frame", i32::MAX as usize + 1)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCount { what: "frame", .. }));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn u32_count_overflow_is_rejected() {
        let mut bytes = Vec::new();
        let err = bytes
            .write_u32_count("bone", u32::MAX as usize + 1)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCount {
                what: "bone",
                count: 4_294_967_296
            }
        ));
        assert!(bytes.is_empty());
    }
}
