use std::collections::HashMap;

use ac_ffmpeg::codec::audio::AudioDecoder;
use ac_ffmpeg::codec::video::VideoDecoder;
use ac_ffmpeg::codec::video::frame::PictureType;
use ac_ffmpeg::codec::{CodecParameters, Decoder};
use ac_ffmpeg::packet::PacketMut;
use ac_ffmpeg::time::{self, Timestamp};

use super::{DecodeOrder, DecoderAdapter, DecoderFactory, DrainResult, PictureOrder, SubmitResult};
use crate::config::DecoderTuning;
use crate::error::{Error, Result};
use crate::pipeline::types::{
    DecodedUnit, EncodedUnit, MediaKind, PictureKind, StreamInfo, TimeBase, VideoOrder,
};
use crate::source::ffmpeg::timestamp_value;

/// Opens libav decoders from the codec parameters found in the container.
pub struct FfmpegDecoderFactory {
    parameters: HashMap<usize, CodecParameters>,
}

impl FfmpegDecoderFactory {
    pub fn new(parameters: HashMap<usize, CodecParameters>) -> Self {
        Self { parameters }
    }
}

impl DecoderFactory for FfmpegDecoderFactory {
    fn open(
        &mut self,
        stream: &StreamInfo,
        tuning: &DecoderTuning,
    ) -> Result<Box<dyn DecoderAdapter>> {
        let unsupported = || Error::UnsupportedCodec {
            index: stream.index,
            codec: stream.codec_name().to_string(),
        };
        let open_error = |e: ac_ffmpeg::Error| Error::DecoderOpen {
            index: stream.index,
            reason: e.to_string(),
        };

        let parameters = self.parameters.get(&stream.index).ok_or_else(unsupported)?;
        if parameters.decoder_name().is_none() {
            return Err(unsupported());
        }
        let time_base = time::TimeBase::new(stream.time_base.num, stream.time_base.den);

        let inner = match stream.kind {
            MediaKind::Video => {
                let params = parameters
                    .as_video_codec_parameters()
                    .ok_or_else(unsupported)?;
                let decoder = VideoDecoder::from_codec_parameters(params)
                    .map_err(open_error)?
                    .time_base(time_base)
                    .set_option("threads", tuning.video_threads)
                    .set_option("thread_type", tuning.thread_type.as_option())
                    .build()
                    .map_err(open_error)?;
                Inner::Video {
                    decoder,
                    order: PictureOrder::new(),
                }
            }
            MediaKind::Audio => {
                let params = parameters
                    .as_audio_codec_parameters()
                    .ok_or_else(unsupported)?;
                let decoder = AudioDecoder::from_codec_parameters(params)
                    .map_err(open_error)?
                    .time_base(time_base)
                    .build()
                    .map_err(open_error)?;
                Inner::Audio {
                    decoder,
                    order: DecodeOrder::new(),
                }
            }
            MediaKind::Other => return Err(unsupported()),
        };

        Ok(Box::new(FfmpegDecoder {
            inner: Some(inner),
            time_base,
        }))
    }
}

enum Inner {
    Video {
        decoder: VideoDecoder,
        order: PictureOrder,
    },
    Audio {
        decoder: AudioDecoder,
        order: DecodeOrder,
    },
}

/// One libav decoder bound to a single stream.
///
/// The decoder is built with the stream time base, so decoded
/// timestamps compare directly with the encoded ones and `time_base`
/// reports that same base. `inner` becomes `None` once closed.
pub struct FfmpegDecoder {
    inner: Option<Inner>,
    time_base: time::TimeBase,
}

impl FfmpegDecoder {
    fn timestamp(&self, value: Option<i64>) -> Timestamp {
        match value {
            Some(value) => Timestamp::new(value, self.time_base),
            None => Timestamp::null(),
        }
    }
}

impl DecoderAdapter for FfmpegDecoder {
    fn time_base(&self) -> TimeBase {
        TimeBase::new(self.time_base.num(), self.time_base.den())
    }

    fn submit(&mut self, unit: &EncodedUnit) -> SubmitResult {
        let packet = PacketMut::from(&unit.payload[..])
            .with_time_base(self.time_base)
            .with_pts(self.timestamp(unit.pts))
            .with_dts(self.timestamp(unit.dts))
            .with_raw_duration(unit.duration)
            .with_key_flag(unit.is_key)
            .freeze();

        let pushed = match &mut self.inner {
            Some(Inner::Video { decoder, order }) => decoder
                .try_push(packet)
                .map(|()| order.submitted(unit.pts, unit.dts)),
            Some(Inner::Audio { decoder, order }) => decoder
                .try_push(packet)
                .map(|()| order.submitted(unit.dts)),
            None => return SubmitResult::Failed("decoder is closed".to_string()),
        };

        match pushed {
            Ok(()) => SubmitResult::Accepted,
            Err(e) if e.is_again() => SubmitResult::TemporarilyFull,
            Err(e) => SubmitResult::Failed(e.to_string()),
        }
    }

    fn drain(&mut self) -> DrainResult {
        match &mut self.inner {
            Some(Inner::Video { decoder, order }) => match decoder.take() {
                Ok(Some(frame)) => {
                    let pts = timestamp_value(frame.pts());
                    let picture_kind = picture_kind(frame.picture_type());
                    let emitted = order.emitted(pts);
                    DrainResult::Unit(DecodedUnit::video(
                        pts,
                        emitted.decode_pts,
                        picture_kind == PictureKind::I,
                        VideoOrder {
                            picture_kind,
                            coded_order: emitted.coded_order,
                            display_order: emitted.display_order,
                        },
                    ))
                }
                Ok(None) => DrainResult::NeedsMoreInput,
                Err(e) => DrainResult::Failed(e.to_string()),
            },
            Some(Inner::Audio { decoder, order }) => match decoder.take() {
                Ok(Some(frame)) => DrainResult::Unit(DecodedUnit::audio(
                    timestamp_value(frame.pts()),
                    order.emitted(),
                )),
                Ok(None) => DrainResult::NeedsMoreInput,
                Err(e) => DrainResult::Failed(e.to_string()),
            },
            None => DrainResult::EndOfStream,
        }
    }

    fn close(&mut self) {
        // dropping the libav context frees it
        self.inner = None;
    }
}

fn picture_kind(picture_type: PictureType) -> PictureKind {
    match picture_type {
        PictureType::None => PictureKind::None,
        PictureType::I => PictureKind::I,
        PictureType::P => PictureKind::P,
        PictureType::B => PictureKind::B,
        PictureType::S => PictureKind::S,
        PictureType::Si => PictureKind::SI,
        PictureType::Sp => PictureKind::SP,
        PictureType::Bi => PictureKind::BI,
    }
}
