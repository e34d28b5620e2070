//! ZMD skeletons: a bone hierarchy with its rest pose plus dummy attachment
//! points.
//!
//! ```text
//! magic      [u8; 7]   "ZMD0002" | "ZMD0003"
//! num_bones  u32
//!   parent       i32 (-1 for a root, otherwise an earlier bone)
//!   name         u16 length + bytes
//!   translation  3 x f32
//!   rotation     4 x f32, w first
//! num_dummies u32
//!   name         u16 length + bytes
//!   parent       i32 bone index
//!   translation  3 x f32
//!   rotation     4 x f32, w first (ZMD0003 only)
//! ```

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Mat4, Quat, Vec3};

use crate::{
    error::{Error, HierarchyError, Result},
    options::DecodeOptions,
    read_ext::MyReadBytesExt,
    text::TextEncoding,
    write_ext::MyWriteBytesExt,
};

const MAGICS: &[&str] = &["ZMD0002", "ZMD0003"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkeletonVersion {
    /// Dummies are stored without a rotation.
    Zmd0002,
    Zmd0003,
}

impl SkeletonVersion {
    pub fn magic(self) -> &'static [u8; 7] {
        match self {
            SkeletonVersion::Zmd0002 => b"ZMD0002",
            SkeletonVersion::Zmd0003 => b"ZMD0003",
        }
    }

    pub fn from_magic(magic: &[u8; 7]) -> Option<Self> {
        match magic {
            b"ZMD0002" => Some(SkeletonVersion::Zmd0002),
            b"ZMD0003" => Some(SkeletonVersion::Zmd0003),
            _ => None,
        }
    }

    pub fn has_dummy_rotation(self) -> bool {
        self == SkeletonVersion::Zmd0003
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub parent: Option<usize>,
    pub translation: Vec3,
    pub rotation: Quat,
    /// Dummies are attachment points and never deform a mesh.
    pub dummy: bool,
    absolute: Mat4,
    inverse_absolute: Mat4,
}

impl Bone {
    pub fn new(
        name: impl Into<String>,
        parent: Option<usize>,
        translation: Vec3,
        rotation: Quat,
    ) -> Self {
        Bone {
            name: name.into(),
            parent,
            translation,
            rotation,
            dummy: false,
            absolute: Mat4::IDENTITY,
            inverse_absolute: Mat4::IDENTITY,
        }
    }

    pub fn new_dummy(
        name: impl Into<String>,
        parent: usize,
        translation: Vec3,
        rotation: Quat,
    ) -> Self {
        Bone {
            dummy: true,
            ..Bone::new(name, Some(parent), translation, rotation)
        }
    }

    /// Rest pose relative to the parent: rotate, then translate.
    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }

    /// Rest pose in skeleton space.
    pub fn absolute_transform(&self) -> Mat4 {
        self.absolute
    }

    pub fn inverse_absolute_transform(&self) -> Mat4 {
        self.inverse_absolute
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// A decoded skeleton. Absolute transforms are composed once on construction
/// and never change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    version: SkeletonVersion,
    bones: Vec<Bone>,
    dummies: Vec<Bone>,
}

impl Skeleton {
    /// Validates the hierarchy and composes every absolute transform.
    ///
    /// Parents must precede their children, and dummies must be parented to
    /// a bone.
    pub fn from_parts(
        version: SkeletonVersion,
        mut bones: Vec<Bone>,
        mut dummies: Vec<Bone>,
    ) -> Result<Self> {
        for i in 0..bones.len() {
            let parent_absolute = match bones[i].parent {
                None => Mat4::IDENTITY,
                Some(parent) if parent < i => bones[parent].absolute,
                Some(parent) => {
                    return Err(HierarchyError::BoneParent {
                        bone: i,
                        parent: parent as i32,
                    }
                    .into());
                }
            };
            let bone = &mut bones[i];
            bone.dummy = false;
            bone.absolute = parent_absolute * bone.local_transform();
            bone.inverse_absolute = bone.absolute.inverse();
        }

        for (i, dummy) in dummies.iter_mut().enumerate() {
            let parent_absolute = match dummy.parent {
                Some(parent) if parent < bones.len() => bones[parent].absolute,
                parent => {
                    return Err(HierarchyError::DummyParent {
                        dummy: i,
                        parent: parent.map_or(-1, |p| p as i32),
                        num_bones: bones.len(),
                    }
                    .into());
                }
            };
            dummy.dummy = true;
            dummy.absolute = parent_absolute * dummy.local_transform();
            dummy.inverse_absolute = dummy.absolute.inverse();
        }

        Ok(Skeleton {
            version,
            bones,
            dummies,
        })
    }

    pub fn read(reader: &mut impl Read, options: &DecodeOptions) -> Result<Self> {
        let magic = reader.read_magic::<7>()?;
        let version =
            SkeletonVersion::from_magic(&magic).ok_or_else(|| Error::MalformedHeader {
                expected: MAGICS,
                found: String::from_utf8_lossy(&magic).into_owned(),
            })?;

        let num_bones = reader.read_u32::<LittleEndian>()? as usize;
        let mut bones = Vec::with_capacity(num_bones.min(1024));
        for i in 0..num_bones {
            let parent = reader.read_i32::<LittleEndian>()?;
            let name = reader.read_length_string(options.text)?;
            let translation = reader.read_vec3()?;
            let rotation = reader.read_quat()?;

            let parent = match parent {
                -1 => None,
                p if p >= 0 => Some(p as usize),
                p => return Err(HierarchyError::BoneParent { bone: i, parent: p }.into()),
            };
            bones.push(Bone::new(name, parent, translation, rotation));
        }

        let num_dummies = reader.read_u32::<LittleEndian>()? as usize;
        let mut dummies = Vec::with_capacity(num_dummies.min(1024));
        for i in 0..num_dummies {
            let name = reader.read_length_string(options.text)?;
            let parent = reader.read_i32::<LittleEndian>()?;
            let translation = reader.read_vec3()?;
            let rotation = if version.has_dummy_rotation() {
                reader.read_quat()?
            } else {
                Quat::IDENTITY
            };

            let parent = usize::try_from(parent).map_err(|_| HierarchyError::DummyParent {
                dummy: i,
                parent,
                num_bones,
            })?;
            dummies.push(Bone::new_dummy(name, parent, translation, rotation));
        }

        let skeleton = Skeleton::from_parts(version, bones, dummies)?;

        log::debug!(
            "decoded {:?} skeleton with {} bones and {} dummies",
            version,
            skeleton.bones.len(),
            skeleton.dummies.len()
        );

        Ok(skeleton)
    }

    pub fn write(&self, writer: &mut impl Write, text: TextEncoding) -> Result<()> {
        writer.write_all(self.version.magic())?;

        writer.write_u32_count("bone", self.bones.len())?;
        for bone in &self.bones {
            writer.write_i32::<LittleEndian>(bone.parent.map_or(-1, |p| p as i32))?;
            writer.write_length_string(&bone.name, text)?;
            writer.write_vec3(bone.translation)?;
            writer.write_quat(bone.rotation)?;
        }

        writer.write_u32_count("dummy", self.dummies.len())?;
        for dummy in &self.dummies {
            writer.write_length_string(&dummy.name, text)?;
            writer.write_i32::<LittleEndian>(dummy.parent.map_or(-1, |p| p as i32))?;
            writer.write_vec3(dummy.translation)?;
            if self.version.has_dummy_rotation() {
                writer.write_quat(dummy.rotation)?;
            } else if dummy.rotation != Quat::IDENTITY {
                log::warn!(
                    "dropping rotation of dummy '{}', {:?} cannot store it",
                    dummy.name,
                    self.version
                );
            }
        }

        Ok(())
    }

    pub fn version(&self) -> SkeletonVersion {
        self.version
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn dummies(&self) -> &[Bone] {
        &self.dummies
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn bone_by_name(&self, name: &str) -> Option<(usize, &Bone)> {
        self.bones.iter().enumerate().find(|(_, b)| b.name == name)
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_root())
            .map(|(i, _)| i)
    }

    /// Bones whose parent is `index`, in index order.
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(move |(_, b)| b.parent == Some(index))
            .map(|(i, _)| i)
    }

    /// Number of ancestors of a bone; roots have depth 0.
    pub fn depth(&self, index: usize) -> Option<usize> {
        let mut depth = 0;
        let mut current = self.bones.get(index)?.parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.bones[parent].parent;
        }
        Some(depth)
    }
}
