//! Hit classification from packed sub-detector identifiers.
//!
//! An identifier is 32 bits: the sub-detector type in bits 28-31 and the
//! channel in bits 0-27. VP channels further pack
//! row (bits 0-7), column (8-15), chip (16-17) and sensor (18-25); four
//! sensors make a module and two modules a station.

use crate::error::TrackError;
use serde::Serialize;

const DETECTOR_SHIFT: u32 = 28;
const CHANNEL_MASK: u32 = 0x0FFF_FFFF;

const DETECTOR_VP: u32 = 2;
const DETECTOR_UT: u32 = 4;
const DETECTOR_FT: u32 = 11;

const SENSORS_PER_MODULE: u32 = 4;

/// Packs a sub-detector type and channel into an identifier.
#[inline]
pub fn pack_lhcb_id(detector: u32, channel: u32) -> u32 {
    (detector << DETECTOR_SHIFT) | (channel & CHANNEL_MASK)
}

/// Identifier of a VP pixel channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct VpChannelId(u32);

impl VpChannelId {
    pub fn new(raw: u32) -> Self {
        Self(raw & CHANNEL_MASK)
    }

    pub fn from_parts(sensor: u32, chip: u32, col: u32, row: u32) -> Self {
        Self::new(((sensor & 0xFF) << 18) | ((chip & 0x3) << 16) | ((col & 0xFF) << 8) | (row & 0xFF))
    }

    /// Key used to match clusters.
    #[inline]
    pub fn channel_id(self) -> u64 {
        self.0 as u64
    }

    /// Full identifier as it appears on a track.
    #[inline]
    pub fn lhcb_id(self) -> u32 {
        pack_lhcb_id(DETECTOR_VP, self.0)
    }

    #[inline]
    pub fn row(self) -> u32 {
        self.0 & 0xFF
    }

    #[inline]
    pub fn col(self) -> u32 {
        (self.0 >> 8) & 0xFF
    }

    #[inline]
    pub fn chip(self) -> u32 {
        (self.0 >> 16) & 0x3
    }

    #[inline]
    pub fn sensor(self) -> u32 {
        (self.0 >> 18) & 0xFF
    }

    #[inline]
    pub fn module(self) -> u32 {
        self.sensor() / SENSORS_PER_MODULE
    }

    #[inline]
    pub fn station(self) -> u32 {
        self.module() / 2
    }

    /// 0 for the left half, 1 for the right half.
    #[inline]
    pub fn sidepos(self) -> u32 {
        self.module() % 2
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VpHit {
    pub lhcb_id: u32,
    pub channel: VpChannelId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UtHit {
    pub lhcb_id: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FtHit {
    pub lhcb_id: u32,
}

/// Hit on a track, tagged by sub-detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hit {
    Vp(VpHit),
    Ut(UtHit),
    Ft(FtHit),
}

impl Hit {
    /// Classifies a raw identifier. Anything outside VP/UT/FT is an error:
    /// it means the track and the detector description disagree.
    pub fn classify(track_key: u32, lhcb_id: u32) -> Result<Hit, TrackError> {
        match lhcb_id >> DETECTOR_SHIFT {
            DETECTOR_VP => Ok(Hit::Vp(VpHit {
                lhcb_id,
                channel: VpChannelId::new(lhcb_id),
            })),
            DETECTOR_UT => Ok(Hit::Ut(UtHit { lhcb_id })),
            DETECTOR_FT => Ok(Hit::Ft(FtHit { lhcb_id })),
            _ => Err(TrackError::UnrecognisedHit { track_key, lhcb_id }),
        }
    }

    pub fn lhcb_id(&self) -> u32 {
        match self {
            Hit::Vp(h) => h.lhcb_id,
            Hit::Ut(h) => h.lhcb_id,
            Hit::Ft(h) => h.lhcb_id,
        }
    }

    pub fn as_vp(&self) -> Option<&VpHit> {
        match self {
            Hit::Vp(h) => Some(h),
            _ => None,
        }
    }
}

/// Identifier helpers for building test and replay data.
pub mod ids {
    use super::*;

    pub fn vp(channel: VpChannelId) -> u32 {
        channel.lhcb_id()
    }

    pub fn ut(channel: u32) -> u32 {
        pack_lhcb_id(DETECTOR_UT, channel)
    }

    pub fn ft(channel: u32) -> u32 {
        pack_lhcb_id(DETECTOR_FT, channel)
    }
}
