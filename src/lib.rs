//! Codecs for ROSE skeleton (ZMD), animation (ZMO) and tag-dispatched record
//! files, and conversion of animations into a y-up, rest-relative pose stream.

use std::io::Cursor;

pub mod animation;
pub mod error;
pub mod options;
pub mod pose;
pub mod read_ext;
pub mod record;
pub mod skeleton;
pub mod text;
pub mod write_ext;

pub use crate::{
    animation::AnimationTrackSet,
    error::{Error, HierarchyError, Result},
    options::{ConvertOptions, DecodeOptions, UnknownChannelPolicy},
    pose::{PoseConverter, PoseSample},
    record::{Registry, TaggedRecord},
    skeleton::Skeleton,
    text::TextEncoding,
};

pub fn decode_skeleton(bytes: &[u8]) -> Result<Skeleton> {
    decode_skeleton_with(bytes, &DecodeOptions::default())
}

pub fn decode_skeleton_with(bytes: &[u8], options: &DecodeOptions) -> Result<Skeleton> {
    let mut reader = Cursor::new(bytes);
    let skeleton = Skeleton::read(&mut reader, options)?;
    warn_trailing("skeleton", &reader);
    Ok(skeleton)
}

pub fn encode_skeleton(skeleton: &Skeleton) -> Result<Vec<u8>> {
    encode_skeleton_with(skeleton, &DecodeOptions::default())
}

pub fn encode_skeleton_with(skeleton: &Skeleton, options: &DecodeOptions) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    skeleton.write(&mut bytes, options.text)?;
    Ok(bytes)
}

pub fn decode_animation(bytes: &[u8], skeleton: &Skeleton) -> Result<AnimationTrackSet> {
    decode_animation_with(bytes, skeleton, &DecodeOptions::default())
}

pub fn decode_animation_with(
    bytes: &[u8],
    skeleton: &Skeleton,
    options: &DecodeOptions,
) -> Result<AnimationTrackSet> {
    let mut reader = Cursor::new(bytes);
    let animation = AnimationTrackSet::read(&mut reader, skeleton, options)?;
    warn_trailing("animation", &reader);
    Ok(animation)
}

pub fn encode_animation(animation: &AnimationTrackSet) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    animation.write(&mut bytes)?;
    Ok(bytes)
}

pub fn convert_pose(skeleton: &Skeleton, animation: &AnimationTrackSet) -> Result<Vec<PoseSample>> {
    PoseConverter::default().convert_all(skeleton, animation)
}

pub fn decode_tagged_container<R: TaggedRecord>(
    bytes: &[u8],
    registry: &Registry<R>,
) -> Result<Vec<R>> {
    decode_tagged_container_with(bytes, registry, &DecodeOptions::default())
}

pub fn decode_tagged_container_with<R: TaggedRecord>(
    bytes: &[u8],
    registry: &Registry<R>,
    options: &DecodeOptions,
) -> Result<Vec<R>> {
    let mut reader = Cursor::new(bytes);
    let records = record::decode_container(&mut reader, registry, options.text)?;
    warn_trailing(registry.family(), &reader);
    Ok(records)
}

pub fn encode_tagged_container<R: TaggedRecord>(
    records: &[R],
    registry: &Registry<R>,
) -> Result<Vec<u8>> {
    encode_tagged_container_with(records, registry, &DecodeOptions::default())
}

pub fn encode_tagged_container_with<R: TaggedRecord>(
    records: &[R],
    registry: &Registry<R>,
    options: &DecodeOptions,
) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    record::encode_container(&mut bytes, registry, records, options.text)?;
    Ok(bytes)
}

fn warn_trailing(what: &str, reader: &Cursor<&[u8]>) {
    let remaining = reader.get_ref().len() as u64 - reader.position();
    if remaining > 0 {
        log::warn!("{remaining} unread bytes after {what} data");
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;
    use crate::{
        animation::{AnimationChannel, TrackType},
        record::action::{self, Action, Say},
        skeleton::{Bone, SkeletonVersion},
    };

    #[test]
    fn skeleton_animation_pose_pipeline() {
        let skeleton = Skeleton::from_parts(
            SkeletonVersion::Zmd0002,
            vec![
                Bone::new("b1", None, Vec3::ZERO, Quat::IDENTITY),
                Bone::new("b2", Some(0), Vec3::Y, Quat::IDENTITY),
            ],
            Vec::new(),
        )
        .unwrap();
        let skeleton = decode_skeleton(&encode_skeleton(&skeleton).unwrap()).unwrap();

        let mut animation = AnimationTrackSet::new(
            &skeleton,
            30,
            2,
            vec![AnimationChannel {
                track: TrackType::Position,
                bone: 1,
            }],
        )
        .unwrap();
        let frames = animation.frames_mut(1).unwrap();
        frames[0].translation = Vec3::new(0.0, 1.0, 0.0);
        frames[1].translation = Vec3::new(0.0, 2.0, 0.0);

        let bytes = encode_animation(&animation).unwrap();
        let decoded = decode_animation(&bytes, &skeleton).unwrap();
        assert_eq!(decoded, animation);

        let samples = convert_pose(&skeleton, &decoded).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].translation, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(samples[1].angle, 0.0);
    }

    #[test]
    fn tagged_container_helpers() {
        let records = vec![Action::Say(Say {
            message: "hi".into(),
        })];
        let bytes = encode_tagged_container(&records, action::registry()).unwrap();
        let decoded = decode_tagged_container(&bytes, action::registry()).unwrap();
        assert_eq!(decoded, records);

        let mut bytes = bytes;
        bytes[4..8].copy_from_slice(&9999i32.to_le_bytes());
        let err = decode_tagged_container(&bytes, action::registry()).unwrap_err();
        assert!(matches!(err, Error::UnknownTag { tag: 9999, .. }));
    }

    #[test]
    fn error_kinds_are_distinct() {
        assert!(matches!(decode_skeleton(b"ZMD00"), Err(Error::Truncated)));
        assert!(matches!(
            decode_skeleton(b"NOTAZMD\0\0\0\0"),
            Err(Error::MalformedHeader { .. })
        ));
    }
}
