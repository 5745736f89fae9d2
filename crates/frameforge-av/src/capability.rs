//! Capability probing.
//!
//! A host reports which raw encode/decode primitives it has as a
//! [`Primitives`] record. Everything here is a pure function of that record;
//! nothing touches a global host object.

use std::fmt;

use frameforge_common::MediaKind;

/// Raw encode/decode primitives present in a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Primitives {
    pub video_decode: bool,
    pub video_encode: bool,
    pub audio_decode: bool,
    pub audio_encode: bool,
}

impl Primitives {
    /// Every primitive present.
    pub const fn all() -> Self {
        Self {
            video_decode: true,
            video_encode: true,
            audio_decode: true,
            audio_encode: true,
        }
    }

    /// No primitive present.
    pub const fn none() -> Self {
        Self {
            video_decode: false,
            video_encode: false,
            audio_decode: false,
            audio_encode: false,
        }
    }
}

/// Per-media capability derived from [`Primitives`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Video can be decoded and encoded.
    pub video: bool,
    /// Audio can be decoded and encoded.
    pub audio: bool,
}

impl From<Primitives> for Capabilities {
    fn from(p: Primitives) -> Self {
        probe(p)
    }
}

/// Derive the structured capability record.
pub fn probe(primitives: Primitives) -> Capabilities {
    Capabilities {
        video: primitives.video_decode && primitives.video_encode,
        audio: primitives.audio_decode && primitives.audio_encode,
    }
}

/// True only when all four primitives are present.
///
/// This is an all-or-nothing gate: a host missing audio encode is
/// unsupported even for image conversions.
pub fn is_supported(primitives: Primitives) -> bool {
    let caps = probe(primitives);
    caps.video && caps.audio
}

/// How the orchestrator gates a conversion on host capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapabilityGate {
    /// Require every primitive regardless of media kind.
    #[default]
    Strict,
    /// Require only the primitives the requested kind uses.
    PerKind,
}

impl CapabilityGate {
    /// Whether a conversion of `kind` may proceed on a host with `primitives`.
    pub fn allows(&self, primitives: Primitives, kind: MediaKind) -> bool {
        match self {
            CapabilityGate::Strict => is_supported(primitives),
            CapabilityGate::PerKind => {
                let caps = probe(primitives);
                match kind {
                    MediaKind::Video => caps.video,
                    MediaKind::Audio => caps.audio,
                    MediaKind::Image => true,
                }
            }
        }
    }
}

impl fmt::Display for CapabilityGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityGate::Strict => write!(f, "strict"),
            CapabilityGate::PerKind => write!(f, "per_kind"),
        }
    }
}
