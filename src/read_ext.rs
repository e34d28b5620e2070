use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};
use glam::{Quat, Vec2, Vec3, Vec4};

use crate::{error::Result, text::TextEncoding};

pub trait MyReadBytesExt: Read {
    fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    fn read_vec2(&mut self) -> Result<Vec2> {
        let x = self.read_f32::<LittleEndian>()?;
        let y = self.read_f32::<LittleEndian>()?;
        Ok(Vec2::new(x, y))
    }

    fn read_vec3(&mut self) -> Result<Vec3> {
        let x = self.read_f32::<LittleEndian>()?;
        let y = self.read_f32::<LittleEndian>()?;
        let z = self.read_f32::<LittleEndian>()?;
        Ok(Vec3::new(x, y, z))
    }

    fn read_vec4(&mut self) -> Result<Vec4> {
        let x = self.read_f32::<LittleEndian>()?;
        let y = self.read_f32::<LittleEndian>()?;
        let z = self.read_f32::<LittleEndian>()?;
        let w = self.read_f32::<LittleEndian>()?;
        Ok(Vec4::new(x, y, z, w))
    }

    /// Quaternions are stored as (w, x, y, z).
    fn read_quat(&mut self) -> Result<Quat> {
        let w = self.read_f32::<LittleEndian>()?;
        let x = self.read_f32::<LittleEndian>()?;
        let y = self.read_f32::<LittleEndian>()?;
        let z = self.read_f32::<LittleEndian>()?;
        Ok(Quat::from_xyzw(x, y, z, w))
    }

    /// u16 byte count followed by that many encoded bytes.
    fn read_length_string(&mut self, text: TextEncoding) -> Result<String> {
        let len = self.read_u16::<LittleEndian>()? as usize;
        let mut bytes = vec![0u8; len];
        self.read_exact(&mut bytes)?;
        Ok(text.decode(&bytes).into_owned())
    }

    fn read_nul_string(&mut self, text: TextEncoding) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            let b = self.read_u8()?;
            if b == 0 {
                break;
            }
            bytes.push(b);
        }
        Ok(text.decode(&bytes).into_owned())
    }

    /// Reads exactly `N` raw bytes, used for format magic.
    fn read_magic<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut magic = [0u8; N];
        self.read_exact(&mut magic)?;
        Ok(magic)
    }
}

impl<R: Read + ?Sized> MyReadBytesExt for R {}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::error::Error;

    use super::*;

    #[test]
    fn quat_is_read_w_first() {
        let mut bytes = Vec::new();
        for v in [1.0f32, 2.0, 3.0, 4.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let q = Cursor::new(bytes).read_quat().unwrap();
        assert_eq!(q, Quat::from_xyzw(2.0, 3.0, 4.0, 1.0));
    }

    #[test]
    fn strings() {
        let mut cursor = Cursor::new(b"\x03\x00abcxyz\x00tail".to_vec());
        let text = TextEncoding::default();
        assert_eq!(cursor.read_length_string(text).unwrap(), "abc");
        assert_eq!(cursor.read_nul_string(text).unwrap(), "xyz");
        assert_eq!(cursor.position(), 9);
    }

    #[test]
    fn short_input_is_truncated() {
        let mut cursor = Cursor::new(vec![0u8; 10]);
        assert!(matches!(cursor.read_vec3(), Err(Error::Truncated)));

        let mut cursor = Cursor::new(b"\x05\x00ab".to_vec());
        assert!(matches!(
            cursor.read_length_string(TextEncoding::default()),
            Err(Error::Truncated)
        ));

        let mut cursor = Cursor::new(b"no terminator".to_vec());
        assert!(matches!(
            cursor.read_nul_string(TextEncoding::default()),
            Err(Error::Truncated)
        ));
    }
}
