//! Decoded frame types and a frame encoder.
//!
//! [`RadarFrame`] is what the decoder hands downstream. [`FrameBuilder`]
//! goes the other way and produces wire bytes, which is how tests and
//! simulated byte sources create traffic without a sensor attached.
//!
//! # Example
//!
//! ```
//! use mmwave_uart::protocol::{DetectedObjectSet, FrameBuilder, FrameDecoder, ParseOutcome};
//!
//! let mut points = DetectedObjectSet::default();
//! points.push(0.1, 0.2, 0.0, 0.0);
//!
//! let bytes = FrameBuilder::new(42).detected_points(&points).build();
//! assert_eq!(bytes.len(), 64);
//!
//! let mut decoder = FrameDecoder::new();
//! match decoder.push(&bytes) {
//!     ParseOutcome::Frame(frame) => assert_eq!(frame.detected_objects, points),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::wire_format::{
    tlv_type, FrameHeader, TlvHeader, DETECTED_POINT_SIZE, HEADER_SIZE, TLV_HEADER_SIZE,
};

/// Detected points as parallel coordinate arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedObjectSet {
    /// Number of objects, echoing the header count.
    pub num_obj: u32,
    /// X coordinates in meters.
    pub x: Vec<f32>,
    /// Y coordinates in meters.
    pub y: Vec<f32>,
    /// Z coordinates in meters.
    pub z: Vec<f32>,
    /// Radial velocity in m/s.
    pub velocity: Vec<f32>,
}

impl DetectedObjectSet {
    /// Create an empty set with room for `n` objects.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            num_obj: 0,
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            z: Vec::with_capacity(n),
            velocity: Vec::with_capacity(n),
        }
    }

    /// Append one object.
    pub fn push(&mut self, x: f32, y: f32, z: f32, velocity: f32) {
        self.x.push(x);
        self.y.push(y);
        self.z.push(z);
        self.velocity.push(velocity);
        self.num_obj += 1;
    }

    /// Number of objects held.
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Check if the set holds no objects.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Iterate objects as `(x, y, z, velocity)` tuples.
    pub fn iter(&self) -> impl Iterator<Item = (f32, f32, f32, f32)> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .zip(&self.velocity)
            .map(|(((x, y), z), v)| (*x, *y, *z, *v))
    }

    /// Encode as a DETECTED_POINTS TLV payload (16 bytes per object).
    pub fn encode_payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len() * DETECTED_POINT_SIZE);
        for (x, y, z, v) in self.iter() {
            buf.extend_from_slice(&x.to_le_bytes());
            buf.extend_from_slice(&y.to_le_bytes());
            buf.extend_from_slice(&z.to_le_bytes());
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }
}

/// One decoded radar frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarFrame {
    /// Frame counter from the header.
    pub frame_number: u32,
    /// Detected points; empty if the frame had no DETECTED_POINTS TLV.
    pub detected_objects: DetectedObjectSet,
    /// Full decoded header.
    pub header: FrameHeader,
}

impl RadarFrame {
    /// Create a frame from its header and decoded points.
    pub fn new(header: FrameHeader, detected_objects: DetectedObjectSet) -> Self {
        Self {
            frame_number: header.frame_number,
            detected_objects,
            header,
        }
    }

    /// Number of detected objects in this frame.
    #[inline]
    pub fn num_objects(&self) -> usize {
        self.detected_objects.len()
    }
}

/// Build a complete frame as a single byte vector.
///
/// `total_packet_length` and `num_tlvs` are filled in from the TLV list;
/// all other header fields are taken from `header` as given.
pub fn build_frame(header: &FrameHeader, tlvs: &[(u32, &[u8])]) -> Vec<u8> {
    let body_len: usize = tlvs
        .iter()
        .map(|(_, payload)| TLV_HEADER_SIZE + payload.len())
        .sum();
    let total = HEADER_SIZE + body_len;

    let header = FrameHeader {
        total_packet_length: total as u32,
        num_tlvs: tlvs.len() as u32,
        ..*header
    };

    let mut buf = Vec::with_capacity(total);
    buf.extend_from_slice(&header.encode());
    for (tlv_type, payload) in tlvs {
        buf.extend_from_slice(&TlvHeader::new(*tlv_type, payload.len() as u32).encode());
        buf.extend_from_slice(payload);
    }
    buf
}

/// Fluent builder for wire frames.
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    header: FrameHeader,
    tlvs: Vec<(u32, Vec<u8>)>,
}

impl FrameBuilder {
    /// Start a frame with the given frame number.
    pub fn new(frame_number: u32) -> Self {
        Self {
            header: FrameHeader {
                frame_number,
                ..Default::default()
            },
            tlvs: Vec::new(),
        }
    }

    /// Set the version field.
    pub fn version(mut self, version: u32) -> Self {
        self.header.version = version;
        self
    }

    /// Set the platform field.
    pub fn platform(mut self, platform: u32) -> Self {
        self.header.platform = platform;
        self
    }

    /// Set the CPU cycle timestamp.
    pub fn time_cpu_cycles(mut self, cycles: u32) -> Self {
        self.header.time_cpu_cycles = cycles;
        self
    }

    /// Set the sub-frame number.
    pub fn sub_frame_number(mut self, sub_frame: u32) -> Self {
        self.header.sub_frame_number = sub_frame;
        self
    }

    /// Append a DETECTED_POINTS TLV and set the header object count.
    pub fn detected_points(mut self, points: &DetectedObjectSet) -> Self {
        self.header.num_detected_objects = points.len() as u32;
        self.tlvs
            .push((tlv_type::DETECTED_POINTS, points.encode_payload()));
        self
    }

    /// Append an arbitrary TLV.
    pub fn tlv(mut self, tlv_type: u32, payload: &[u8]) -> Self {
        self.tlvs.push((tlv_type, payload.to_vec()));
        self
    }

    /// Header as it will be encoded.
    pub fn header(&self) -> FrameHeader {
        let body_len: usize = self
            .tlvs
            .iter()
            .map(|(_, p)| TLV_HEADER_SIZE + p.len())
            .sum();
        FrameHeader {
            total_packet_length: (HEADER_SIZE + body_len) as u32,
            num_tlvs: self.tlvs.len() as u32,
            ..self.header
        }
    }

    /// Encode the frame.
    pub fn build(&self) -> Vec<u8> {
        let tlvs: Vec<(u32, &[u8])> = self
            .tlvs
            .iter()
            .map(|(t, p)| (*t, p.as_slice()))
            .collect();
        build_frame(&self.header, &tlvs)
    }
}
