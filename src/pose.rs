use glam::{Quat, Vec3};

use crate::{
    animation::AnimationTrackSet,
    error::{HierarchyError, Result},
    options::ConvertOptions,
    skeleton::Skeleton,
};

/// Below this, the rotation is treated as identity when extracting an axis.
const AXIS_EPSILON: f32 = 1e-6;

/// A bone's pose at one frame, in the target convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    pub bone: usize,
    pub frame: usize,
    pub translation: Vec3,
    /// Rotation relative to the bone's rest orientation.
    pub rotation: Quat,
    pub axis: Vec3,
    /// Radians, in `[0, pi]`.
    pub angle: f32,
    pub scale: Vec3,
}

/// Splits a rotation into a unit axis and an angle.
///
/// `q` and `-q` give the same result. Rotations too close to identity to
/// have a meaningful axis return `(Vec3::X, 0.0)`.
pub fn axis_angle(rotation: Quat) -> (Vec3, f32) {
    let length = rotation.length();
    if length.is_nan() || length <= AXIS_EPSILON {
        return (Vec3::X, 0.0);
    }
    let mut q = rotation / length;
    if q.w < 0.0 {
        q = -q;
    }

    let sin_half = q.xyz().length();
    if sin_half < AXIS_EPSILON {
        return (Vec3::X, 0.0);
    }

    let angle = 2.0 * sin_half.atan2(q.w);
    (q.xyz() / sin_half, angle)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PoseConverter {
    options: ConvertOptions,
}

impl PoseConverter {
    pub fn new(options: ConvertOptions) -> Self {
        PoseConverter { options }
    }

    /// Converts one bone at one frame. Returns `None` when either index is out
    /// of range for the given skeleton and animation.
    pub fn convert(
        &self,
        skeleton: &Skeleton,
        animation: &AnimationTrackSet,
        bone: usize,
        frame: usize,
    ) -> Option<PoseSample> {
        let rest = skeleton.bone(bone)?;
        let sample = animation.frame(bone, frame)?;

        let rotation = rest.rotation.inverse() * sample.rotation;

        // roots are placed in world space, everything else is parent relative
        let translation = if rest.is_root() {
            self.options.basis * (sample.translation * self.options.unit_scale)
        } else {
            sample.translation
        };

        let (axis, angle) = axis_angle(rotation);

        Some(PoseSample {
            bone,
            frame,
            translation,
            rotation,
            axis,
            angle,
            scale: Vec3::splat(sample.scale),
        })
    }

    /// Converts every frame of every bone the animation has channels for,
    /// bone by bone.
    pub fn convert_all(
        &self,
        skeleton: &Skeleton,
        animation: &AnimationTrackSet,
    ) -> Result<Vec<PoseSample>> {
        if skeleton.bones().len() != animation.num_bones() {
            return Err(HierarchyError::SkeletonMismatch {
                skeleton_bones: skeleton.bones().len(),
                animation_bones: animation.num_bones(),
            }
            .into());
        }

        let samples = animation
            .referenced_bones()
            .flat_map(|bone| (0..animation.num_frames()).map(move |frame| (bone, frame)))
            .filter_map(|(bone, frame)| self.convert(skeleton, animation, bone, frame))
            .collect::<Vec<_>>();

        log::debug!(
            "converted {} pose samples over {} frames",
            samples.len(),
            animation.num_frames()
        );

        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use super::*;
    use crate::{
        animation::{AnimationChannel, AnimationFrame, TrackType},
        error::Error,
        skeleton::{Bone, SkeletonVersion},
    };

    fn skeleton() -> Skeleton {
        Skeleton::from_parts(
            SkeletonVersion::Zmd0003,
            vec![
                Bone::new("root", None, Vec3::new(0.0, 0.0, 100.0), Quat::IDENTITY),
                Bone::new(
                    "spine",
                    Some(0),
                    Vec3::new(0.0, 0.0, 20.0),
                    Quat::from_rotation_z(FRAC_PI_2),
                ),
                Bone::new("head", Some(1), Vec3::new(0.0, 0.0, 30.0), Quat::IDENTITY),
            ],
            Vec::new(),
        )
        .unwrap()
    }

    fn animation(skeleton: &Skeleton) -> AnimationTrackSet {
        let channels = vec![
            AnimationChannel {
                track: TrackType::Position,
                bone: 0,
            },
            AnimationChannel {
                track: TrackType::Rotation,
                bone: 1,
            },
            AnimationChannel {
                track: TrackType::Scale,
                bone: 1,
            },
        ];
        let mut animation = AnimationTrackSet::new(skeleton, 30, 3, channels).unwrap();
        for (i, frame) in animation.frames_mut(0).unwrap().iter_mut().enumerate() {
            frame.translation = Vec3::new(i as f32 * 10.0, 0.0, 100.0);
        }
        for (i, frame) in animation.frames_mut(1).unwrap().iter_mut().enumerate() {
            frame.rotation = Quat::from_rotation_z(FRAC_PI_2 + i as f32 * 0.5);
            frame.scale = 1.0 + i as f32;
        }
        animation
    }

    #[test]
    fn identity_has_a_stable_axis() {
        let (axis, angle) = axis_angle(Quat::IDENTITY);
        assert_eq!(angle, 0.0);
        assert_eq!(axis, Vec3::X);

        let (axis, angle) = axis_angle(-Quat::IDENTITY);
        assert_eq!(angle, 0.0);
        assert_eq!(axis, Vec3::X);

        let nearly = Quat::from_xyzw(1e-9, -1e-9, 0.0, 1.0);
        let (axis, angle) = axis_angle(nearly);
        assert!(axis.is_finite());
        assert!(angle.abs() < 1e-6);

        let (axis, angle) = axis_angle(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0));
        assert_eq!((axis, angle), (Vec3::X, 0.0));
    }

    #[test]
    fn negated_quaternion_gives_the_same_axis_angle() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 2.0, 3.0).normalize(), 2.5);
        let (axis, angle) = axis_angle(q);
        let (neg_axis, neg_angle) = axis_angle(-q);
        assert_eq!(axis, neg_axis);
        assert_eq!(angle, neg_angle);
        assert!((angle - 2.5).abs() < 1e-5);
        assert!(axis.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0).normalize(), 1e-5));
    }

    #[test]
    fn unnormalized_input_is_normalized() {
        let q = Quat::from_rotation_y(PI / 3.0) * 4.0;
        let (axis, angle) = axis_angle(q);
        assert!(axis.abs_diff_eq(Vec3::Y, 1e-5));
        assert!((angle - PI / 3.0).abs() < 1e-5);
    }

    #[test]
    fn rest_rotation_is_removed() {
        let skeleton = skeleton();
        let animation = animation(&skeleton);
        let converter = PoseConverter::default();

        let first = converter.convert(&skeleton, &animation, 1, 0).unwrap();
        assert!(first.rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
        assert_eq!(first.angle, 0.0);

        let last = converter.convert(&skeleton, &animation, 1, 2).unwrap();
        assert!(last.axis.abs_diff_eq(Vec3::Z, 1e-5));
        assert!((last.angle - 1.0).abs() < 1e-5);
        assert_eq!(last.scale, Vec3::splat(3.0));
        // non-root translation is parent relative and passes through
        assert_eq!(last.translation, Vec3::ZERO);
    }

    #[test]
    fn root_translation_changes_basis_and_units() {
        let skeleton = skeleton();
        let animation = animation(&skeleton);
        let converter = PoseConverter::default();

        let sample = converter.convert(&skeleton, &animation, 0, 2).unwrap();
        // z-up centimetres to y-up metres
        assert!(sample.translation.abs_diff_eq(Vec3::new(0.2, 1.0, 0.0), 1e-5));

        let raw = PoseConverter::new(ConvertOptions {
            basis: Quat::IDENTITY,
            unit_scale: 1.0,
        })
        .convert(&skeleton, &animation, 0, 2)
        .unwrap();
        assert_eq!(raw.translation, Vec3::new(20.0, 0.0, 100.0));
    }

    #[test]
    fn samples_cover_referenced_bones_only() {
        let skeleton = skeleton();
        let animation = animation(&skeleton);
        let samples = PoseConverter::default()
            .convert_all(&skeleton, &animation)
            .unwrap();

        assert_eq!(samples.len(), 2 * 3);
        assert!(samples.iter().all(|s| s.bone != 2));
        let order = samples.iter().map(|s| (s.bone, s.frame)).collect::<Vec<_>>();
        assert_eq!(order, [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);

        // the untouched bone still reads back default frames
        assert!((0..3).all(|f| animation.frame(2, f) == Some(AnimationFrame::default())));
    }

    #[test]
    fn conversion_is_repeatable() {
        let skeleton = skeleton();
        let animation = animation(&skeleton);
        let before = (skeleton.clone(), animation.clone());

        let converter = PoseConverter::default();
        let first = converter.convert_all(&skeleton, &animation).unwrap();
        let second = converter.convert_all(&skeleton, &animation).unwrap();
        assert_eq!(first, second);
        assert_eq!((skeleton, animation), before);
    }

    #[test]
    fn out_of_range_and_mismatched_inputs() {
        let skeleton = skeleton();
        let animation = animation(&skeleton);
        let converter = PoseConverter::default();
        assert!(converter.convert(&skeleton, &animation, 3, 0).is_none());
        assert!(converter.convert(&skeleton, &animation, 0, 3).is_none());

        let small = Skeleton::from_parts(
            SkeletonVersion::Zmd0003,
            vec![Bone::new("root", None, Vec3::ZERO, Quat::IDENTITY)],
            Vec::new(),
        )
        .unwrap();
        let err = converter.convert_all(&small, &animation).unwrap_err();
        assert!(matches!(
            err,
            Error::Hierarchy(HierarchyError::SkeletonMismatch {
                skeleton_bones: 1,
                animation_bones: 3
            })
        ));
    }
}
