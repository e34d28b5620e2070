use glam::Quat;

use crate::text::TextEncoding;

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub text: TextEncoding,
    pub unknown_channels: UnknownChannelPolicy,
}

/// What the animation decoder does with a track type it does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownChannelPolicy {
    /// Fail with [`crate::Error::UnknownTag`].
    #[default]
    Reject,
    /// Treat the channel as carrying no payload and keep going.
    Skip,
}

/// Target convention for [`crate::pose::PoseConverter`].
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    /// Basis change applied to root bone translations.
    pub basis: Quat,
    /// Unit conversion applied to root bone translations.
    pub unit_scale: f32,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            basis: Quat::from_rotation_x(-90.0f32.to_radians()),
            unit_scale: 0.01,
        }
    }
}
