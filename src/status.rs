//! Status codes exchanged with the streaming engine.

/// Engine status for a successfully handled decode unit.
pub const DR_OK: i32 = 0;
/// Engine status asking the host for a fresh IDR frame.
pub const DR_NEED_IDR: i32 = -1;

/// Outcome of handing a frame to the video renderer or submitting a decode unit.
///
/// The engine only distinguishes `0` (accepted) and `-1` (request a keyframe); any other
/// value is renderer-defined and is passed back verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeStatus {
    /// Frame accepted
    Ok,
    /// The stream cannot continue until the host sends a keyframe
    NeedKeyframe,
    /// Renderer-defined failure code
    Rejected(i32),
}

impl DecodeStatus {
    /// Convert a raw engine or renderer status into a [`DecodeStatus`].
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            DR_OK => DecodeStatus::Ok,
            DR_NEED_IDR => DecodeStatus::NeedKeyframe,
            other => DecodeStatus::Rejected(other),
        }
    }

    /// Raw status as expected by the engine.
    pub fn as_raw(self) -> i32 {
        match self {
            DecodeStatus::Ok => DR_OK,
            DecodeStatus::NeedKeyframe => DR_NEED_IDR,
            DecodeStatus::Rejected(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        self == DecodeStatus::Ok
    }
}

impl From<i32> for DecodeStatus {
    fn from(raw: i32) -> Self {
        DecodeStatus::from_raw(raw)
    }
}

impl From<DecodeStatus> for i32 {
    fn from(status: DecodeStatus) -> Self {
        status.as_raw()
    }
}
