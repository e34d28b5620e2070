//! ZMO animations: per-frame samples for a fixed list of (track, bone)
//! channels.
//!
//! ```text
//! magic         [u8; 7]  "ZMO0002"
//! padding       u8
//! fps           i32
//! num_frames    i32
//! num_channels  i32
//!   track type  i32
//!   bone        i32
//! num_frames x num_channels samples, frame-major
//! ```

use std::io::{Read, Write};

use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Quat, Vec2, Vec3};

use crate::{
    error::{self, Error, HierarchyError, Result},
    options::{DecodeOptions, UnknownChannelPolicy},
    read_ext::MyReadBytesExt,
    skeleton::Skeleton,
    write_ext::MyWriteBytesExt,
};

const MAGIC: &[u8; 7] = b"ZMO0002";

#[repr(i32)]
#[derive(strum::FromRepr, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackType {
    Position = 1 << 1,
    Rotation = 1 << 2,
    Normal = 1 << 3,
    Alpha = 1 << 4,
    Uv1 = 1 << 5,
    Uv2 = 1 << 6,
    Uv3 = 1 << 7,
    Uv4 = 1 << 8,
    TextureAnim = 1 << 9,
    Scale = 1 << 10,
}

impl TrackType {
    pub fn flag(self) -> TrackFlags {
        TrackFlags::from_bits_truncate(self as i32 as u32)
    }

    /// Bytes one sample of this track takes up in a frame.
    pub fn payload_size(self) -> usize {
        match self {
            TrackType::Position | TrackType::Normal => 12,
            TrackType::Rotation => 16,
            TrackType::Uv1 | TrackType::Uv2 | TrackType::Uv3 | TrackType::Uv4 => 8,
            TrackType::Alpha | TrackType::TextureAnim | TrackType::Scale => 4,
        }
    }
}

bitflags! {
    /// Track types declared for a bone.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct TrackFlags: u32 {
        const POSITION = 1 << 1;
        const ROTATION = 1 << 2;
        const NORMAL = 1 << 3;
        const ALPHA = 1 << 4;
        const UV1 = 1 << 5;
        const UV2 = 1 << 6;
        const UV3 = 1 << 7;
        const UV4 = 1 << 8;
        const TEXTURE_ANIM = 1 << 9;
        const SCALE = 1 << 10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationChannel {
    pub track: TrackType,
    pub bone: usize,
}

/// One bone's state at one frame. Tracks that are not declared for the bone
/// keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub normal: Vec3,
    pub alpha: f32,
    pub texture_index: f32,
    pub uv: [Vec2; 4],
}

impl Default for AnimationFrame {
    fn default() -> Self {
        AnimationFrame {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
            normal: Vec3::ZERO,
            alpha: 1.0,
            texture_index: 0.0,
            uv: [Vec2::ZERO; 4],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct BoneTrack {
    flags: TrackFlags,
    frames: Vec<AnimationFrame>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTrackSet {
    fps: i32,
    num_frames: usize,
    channels: Vec<AnimationChannel>,
    tracks: Vec<BoneTrack>,
}

impl AnimationTrackSet {
    /// Creates a track set with a default-filled frame array for every bone
    /// that one of `channels` targets. Other bones of `skeleton` read back
    /// default frames without storing any.
    pub fn new(
        skeleton: &Skeleton,
        fps: i32,
        num_frames: usize,
        channels: Vec<AnimationChannel>,
    ) -> Result<Self> {
        let num_bones = skeleton.bones().len();
        let mut tracks = vec![
            BoneTrack {
                flags: TrackFlags::empty(),
                frames: Vec::new(),
            };
            num_bones
        ];

        for (i, channel) in channels.iter().enumerate() {
            let Some(track) = tracks.get_mut(channel.bone) else {
                return Err(HierarchyError::ChannelBone {
                    channel: i,
                    bone: channel.bone as i32,
                    num_bones,
                }
                .into());
            };
            track.flags |= channel.track.flag();
        }

        for track in tracks.iter_mut().filter(|t| !t.flags.is_empty()) {
            track.frames = vec![AnimationFrame::default(); num_frames];
        }

        Ok(AnimationTrackSet {
            fps,
            num_frames,
            channels,
            tracks,
        })
    }

    pub fn read(
        reader: &mut impl Read,
        skeleton: &Skeleton,
        options: &DecodeOptions,
    ) -> Result<Self> {
        let magic = reader.read_magic::<7>()?;
        if &magic != MAGIC {
            return Err(Error::MalformedHeader {
                expected: &["ZMO0002"],
                found: String::from_utf8_lossy(&magic).into_owned(),
            });
        }
        let _padding = reader.read_u8()?;

        let fps = reader.read_i32::<LittleEndian>()?;
        let num_frames = error::count("frame", reader.read_i32::<LittleEndian>()?)?;
        let num_channels = error::count("channel", reader.read_i32::<LittleEndian>()?)?;

        let num_bones = skeleton.bones().len();
        let mut channels = Vec::with_capacity(num_channels.min(1024));
        for i in 0..num_channels {
            let track_type = reader.read_i32::<LittleEndian>()?;
            let bone = reader.read_i32::<LittleEndian>()?;

            let Some(track) = TrackType::from_repr(track_type) else {
                match options.unknown_channels {
                    UnknownChannelPolicy::Reject => {
                        return Err(Error::UnknownTag {
                            family: "animation channel",
                            tag: track_type,
                        });
                    }
                    UnknownChannelPolicy::Skip => {
                        log::warn!("skipping channel {i} with unknown track type {track_type}");
                        continue;
                    }
                }
            };

            let bone = usize::try_from(bone)
                .ok()
                .filter(|&b| b < num_bones)
                .ok_or(HierarchyError::ChannelBone {
                    channel: i,
                    bone,
                    num_bones,
                })?;
            channels.push(AnimationChannel { track, bone });
        }

        let stride = channels
            .iter()
            .map(|c| c.track.payload_size())
            .sum::<usize>();
        let len = num_frames
            .checked_mul(stride)
            .ok_or(Error::InvalidCount {
                what: "frame",
                count: num_frames as i64,
            })?;

        // nothing is sized from the frame count until its payload is in hand
        let mut payload = Vec::new();
        reader.by_ref().take(len as u64).read_to_end(&mut payload)?;
        if payload.len() < len {
            return Err(Error::Truncated);
        }

        let mut animation = AnimationTrackSet::new(skeleton, fps, num_frames, channels)?;

        let mut payload = payload.as_slice();
        for frame in 0..num_frames {
            for channel in &animation.channels {
                let sample = &mut animation.tracks[channel.bone].frames[frame];
                match channel.track {
                    TrackType::Position => sample.translation = payload.read_vec3()?,
                    TrackType::Rotation => sample.rotation = payload.read_quat()?,
                    TrackType::Normal => sample.normal = payload.read_vec3()?,
                    TrackType::Alpha => sample.alpha = payload.read_f32::<LittleEndian>()?,
                    TrackType::Uv1 => sample.uv[0] = payload.read_vec2()?,
                    TrackType::Uv2 => sample.uv[1] = payload.read_vec2()?,
                    TrackType::Uv3 => sample.uv[2] = payload.read_vec2()?,
                    TrackType::Uv4 => sample.uv[3] = payload.read_vec2()?,
                    TrackType::TextureAnim => {
                        sample.texture_index = payload.read_f32::<LittleEndian>()?
                    }
                    TrackType::Scale => sample.scale = payload.read_f32::<LittleEndian>()?,
                }
            }
        }

        log::debug!(
            "decoded animation with {} frames at {} fps over {} channels",
            num_frames,
            fps,
            animation.channels.len()
        );

        Ok(animation)
    }

    pub fn write(&self, writer: &mut impl Write) -> Result<()> {
        writer.write_all(MAGIC)?;
        writer.write_u8(0)?;
        writer.write_i32::<LittleEndian>(self.fps)?;
        writer.write_count("frame", self.num_frames)?;
        writer.write_count("channel", self.channels.len())?;
        for channel in &self.channels {
            writer.write_i32::<LittleEndian>(channel.track as i32)?;
            writer.write_count("bone", channel.bone)?;
        }

        for frame in 0..self.num_frames {
            for channel in &self.channels {
                let sample = &self.tracks[channel.bone].frames[frame];
                match channel.track {
                    TrackType::Position => writer.write_vec3(sample.translation)?,
                    TrackType::Rotation => writer.write_quat(sample.rotation)?,
                    TrackType::Normal => writer.write_vec3(sample.normal)?,
                    TrackType::Alpha => writer.write_f32::<LittleEndian>(sample.alpha)?,
                    TrackType::Uv1 => writer.write_vec2(sample.uv[0])?,
                    TrackType::Uv2 => writer.write_vec2(sample.uv[1])?,
                    TrackType::Uv3 => writer.write_vec2(sample.uv[2])?,
                    TrackType::Uv4 => writer.write_vec2(sample.uv[3])?,
                    TrackType::TextureAnim => {
                        writer.write_f32::<LittleEndian>(sample.texture_index)?
                    }
                    TrackType::Scale => writer.write_f32::<LittleEndian>(sample.scale)?,
                }
            }
        }

        Ok(())
    }

    pub fn fps(&self) -> i32 {
        self.fps
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Length in seconds, or zero when the frame rate is not positive.
    pub fn duration(&self) -> f32 {
        if self.fps <= 0 {
            return 0.0;
        }
        self.num_frames as f32 / self.fps as f32
    }

    pub fn channels(&self) -> &[AnimationChannel] {
        &self.channels
    }

    pub fn num_bones(&self) -> usize {
        self.tracks.len()
    }

    /// Stored frames of a bone that at least one channel targets.
    pub fn frames(&self, bone: usize) -> Option<&[AnimationFrame]> {
        self.tracks
            .get(bone)
            .filter(|t| !t.flags.is_empty())
            .map(|t| t.frames.as_slice())
    }

    pub fn frames_mut(&mut self, bone: usize) -> Option<&mut [AnimationFrame]> {
        self.tracks
            .get_mut(bone)
            .filter(|t| !t.flags.is_empty())
            .map(|t| t.frames.as_mut_slice())
    }

    /// One bone at one frame. Bones without channels give the default frame.
    pub fn frame(&self, bone: usize, frame: usize) -> Option<AnimationFrame> {
        let track = self.tracks.get(bone)?;
        if frame >= self.num_frames {
            return None;
        }
        Some(track.frames.get(frame).copied().unwrap_or_default())
    }

    pub fn flags(&self, bone: usize) -> TrackFlags {
        self.tracks
            .get(bone)
            .map_or(TrackFlags::empty(), |t| t.flags)
    }

    pub fn is_referenced(&self, bone: usize) -> bool {
        !self.flags(bone).is_empty()
    }

    /// Bones targeted by at least one channel, in index order.
    pub fn referenced_bones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.tracks.len()).filter(move |&bone| self.is_referenced(bone))
    }
}
