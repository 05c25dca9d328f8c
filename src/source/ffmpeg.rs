//! FFmpeg backed source reader

use std::collections::HashMap;

use ac_ffmpeg::codec::CodecParameters;
use ac_ffmpeg::format::demuxer::{Demuxer, DemuxerWithStreamInfo};
use ac_ffmpeg::format::io::IO;
use ac_ffmpeg::packet::Packet;
use ac_ffmpeg::time::Timestamp;
use bytes::Bytes;
use log::info;

use super::{InputLocation, InputStream, Source};
use crate::config::SourceOptions;
use crate::decoder::ffmpeg::FfmpegDecoderFactory;
use crate::error::{Error, Result};
use crate::pipeline::types::{EncodedUnit, MediaKind, StreamInfo, TimeBase};

/// Container demuxer over any input location.
pub struct FfmpegSource {
    demuxer: DemuxerWithStreamInfo<InputStream>,
    streams: Vec<StreamInfo>,
    parameters: HashMap<usize, CodecParameters>,
}

impl FfmpegSource {
    /// Open `url` and read the container header.
    ///
    /// Every failure here is fatal for the run.
    pub fn open(url: &str, options: &SourceOptions) -> Result<Self> {
        let location = InputLocation::parse(url)?;
        let open_error = |reason: String| Error::Open {
            url: url.to_string(),
            reason,
        };

        let stream = InputStream::open(&location, options).map_err(|e| open_error(e.to_string()))?;
        let io = if location.is_seekable() {
            IO::from_seekable_read_stream(stream)
        } else {
            IO::from_read_stream(stream)
        };

        let demuxer = Demuxer::builder()
            .set_option("probesize", options.probe_size.to_string())
            .build(io)
            .map_err(|e| open_error(e.to_string()))?;

        let demuxer = demuxer
            .find_stream_info(Some(options.max_analyze_duration))
            .map_err(|(_, e)| Error::StreamInfo(e.to_string()))?;

        let mut streams = Vec::new();
        let mut parameters = HashMap::new();
        for (index, stream) in demuxer.streams().iter().enumerate() {
            let codec_parameters = stream.codec_parameters();
            let time_base = stream.time_base();
            let kind = if codec_parameters.is_video_codec() {
                MediaKind::Video
            } else if codec_parameters.is_audio_codec() {
                MediaKind::Audio
            } else {
                MediaKind::Other
            };

            streams.push(StreamInfo {
                index,
                kind,
                codec: codec_parameters.decoder_name().map(str::to_string),
                time_base: TimeBase::new(time_base.num(), time_base.den()),
            });
            parameters.insert(index, codec_parameters);
        }

        info!("Opened {} with {} streams", location, streams.len());
        for stream in &streams {
            info!(
                "Stream {}: {}: codec {}, timebase={}",
                stream.index,
                stream.kind,
                stream.codec_name(),
                stream.time_base
            );
        }

        Ok(FfmpegSource {
            demuxer,
            streams,
            parameters,
        })
    }

    /// Factory able to open a decoder for each decodable stream.
    pub fn decoder_factory(&self) -> FfmpegDecoderFactory {
        FfmpegDecoderFactory::new(self.parameters.clone())
    }
}

impl Source for FfmpegSource {
    fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    fn read_next(&mut self) -> Result<Option<EncodedUnit>> {
        match self.demuxer.take() {
            Ok(Some(packet)) => Ok(Some(encoded_unit(&packet))),
            Ok(None) => Ok(None),
            Err(e) => Err(Error::Read(e.to_string())),
        }
    }
}

/// Raw value of a timestamp, `None` for the unknown sentinel.
pub(crate) fn timestamp_value(ts: Timestamp) -> Option<i64> {
    if ts.is_null() {
        None
    } else {
        Some(ts.timestamp())
    }
}

/// Demuxed packets are already in their stream time base, so the raw
/// fields map one to one.
fn encoded_unit(packet: &Packet) -> EncodedUnit {
    EncodedUnit::new(
        packet.stream_index(),
        timestamp_value(packet.pts()),
        timestamp_value(packet.dts()),
        packet.raw_duration().max(0),
    )
    .with_key_flag(packet.is_key())
    .with_payload(Bytes::copy_from_slice(packet.data()))
}

#[cfg(all(test, feature = "ffmpeg"))]
mod tests {
    use super::*;
    use ac_ffmpeg::packet::PacketMut;
    use ac_ffmpeg::time::TimeBase;

    #[test]
    fn test_timestamp_value() {
        let tb = TimeBase::new(1, 90_000);
        assert_eq!(timestamp_value(Timestamp::new(3_003, tb)), Some(3_003));
        assert_eq!(timestamp_value(Timestamp::null()), None);
    }

    #[test]
    fn test_packet_fields_map_to_unit() {
        let tb = TimeBase::new(1, 90_000);
        let packet = PacketMut::from(&b"\x00\x00\x01\x65"[..])
            .with_stream_index(2)
            .with_time_base(tb)
            .with_pts(Timestamp::new(6_006, tb))
            .with_dts(Timestamp::null())
            .with_raw_duration(3_003)
            .with_key_flag(true)
            .freeze();

        let unit = encoded_unit(&packet);
        assert_eq!(unit.stream_index, 2);
        assert_eq!(unit.pts, Some(6_006));
        assert_eq!(unit.dts, None);
        assert_eq!(unit.duration, 3_003);
        assert!(unit.is_key);
        assert_eq!(&unit.payload[..], b"\x00\x00\x01\x65");
    }

    #[test]
    fn test_unknown_duration_is_zero() {
        let packet = PacketMut::from(&b"\x00"[..]).freeze();
        assert_eq!(encoded_unit(&packet).duration, 0);
    }
}
