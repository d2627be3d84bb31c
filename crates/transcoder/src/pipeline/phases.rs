//! Build phases, applied strictly in order. Each takes the context by
//! value and returns it updated; later phases rely on what earlier ones
//! settled (reconciliation assumes sizes are final, outputs assume the
//! encoder is known).

use channelcast_core::{
    AudioFormat, FfmpegState, FrameSize, FrameState, OutputFormat, PixelFormat,
    SoftwarePixelFormat,
};
use tracing::{debug, info, warn};

use super::BackendPipeline;
use super::context::BuildContext;
use crate::decoder::Decoder;
use crate::encoder::{AudioEncoder, RequiredLocation, VideoEncoder};
use crate::filter::complex::{ComplexFilter, GraphInputs};
use crate::filter::{
    AudioFilter, CropFilter, DeinterlaceFilter, DeinterlaceKind, HardwareDownloadFilter,
    HardwareFormatFilter, HardwareUploadFilter, OverlayFilter, OverlayKind, OverlayPosition,
    PadFilter, PadKind, PixelFormatFilter, ScaleFilter, ScaleKind, SubtitlesFilter, TonemapFilter,
    TonemapKind, VideoFilter,
};
use crate::hls::hls_gop_size;
use crate::input::{InputSource, SubtitleMethod, group_inputs};
use crate::step::environment;
use crate::step::{
    GlobalOption, HardwareAccelerationOption, InputOption, OutputOption, PipelineStep,
};

/// Hardware overlays are unreliable before this major version.
const HARDWARE_OVERLAY_MIN_MAJOR: u32 = 5;

pub(super) fn run<'a>(backend: &dyn BackendPipeline, ctx: BuildContext<'a>) -> BuildContext<'a> {
    let mut ctx = ctx;
    ctx.steps.extend(global_steps(&ctx.ffmpeg_state));
    let ctx = declare_hardware(backend, ctx);
    let ctx = attach_decoder(backend, ctx);
    let ctx = if ctx.is_copy() {
        ctx
    } else {
        let ctx = deinterlace(backend, ctx);
        let ctx = tonemap(backend, ctx);
        let ctx = scale(backend, ctx);
        let ctx = crop(ctx);
        let ctx = pad(backend, ctx);
        let ctx = choose_overlay(backend, ctx);
        let ctx = subtitles(backend, ctx);
        watermark(backend, ctx)
    };
    let ctx = attach_encoder(backend, ctx);
    let ctx = reconcile_pixel_format(ctx);
    outputs(backend, ctx)
}

pub(super) fn global_steps(state: &FfmpegState) -> Vec<PipelineStep> {
    let mut steps = vec![
        PipelineStep::Global(GlobalOption::NoStandardInput),
        PipelineStep::Global(GlobalOption::HideBanner),
        PipelineStep::Global(GlobalOption::NoStats),
        PipelineStep::Global(GlobalOption::LogLevel(state.log_level)),
        PipelineStep::Global(GlobalOption::StandardFormatFlags),
    ];
    if let Some(threads) = state.thread_count {
        steps.push(PipelineStep::Global(GlobalOption::Threads(threads)));
    }
    steps
}

/// Muxer decoration shared by every pipeline, ahead of the format.
pub(super) fn decoration_steps(state: &FfmpegState, timescale: Option<u32>) -> Vec<PipelineStep> {
    let mut options = vec![OutputOption::NoMuxDelay, OutputOption::NoMetadata];
    if state.output_format == OutputFormat::MpegTs {
        if let Some(provider) = &state.metadata_service_provider {
            options.push(OutputOption::Metadata {
                key: "service_provider".into(),
                value: provider.clone(),
            });
        }
        if let Some(name) = &state.metadata_service_name {
            options.push(OutputOption::Metadata {
                key: "service_name".into(),
                value: name.clone(),
            });
        }
    }
    if let (Some(offset), Some(timescale)) = (state.pts_offset, timescale)
        && timescale > 0
    {
        options.push(OutputOption::OutputTsOffset(offset as f64 / f64::from(timescale)));
    }
    if let Some(duration) = state.duration {
        options.push(OutputOption::Duration(duration));
    }
    options.into_iter().map(PipelineStep::Output).collect()
}

/// Hardware encoder for the desired output once every gate passed.
fn hardware_encoder(backend: &dyn BackendPipeline, ctx: &BuildContext<'_>) -> Option<VideoEncoder> {
    let encoder = backend.hardware_encoder(ctx)?;
    let desired = &ctx.desired;
    if !ctx.hardware.can_encode(
        desired.video_format,
        desired.video_profile.as_deref(),
        desired.pixel_format,
    ) {
        debug!(format = %desired.video_format, "hardware cannot encode target");
        return None;
    }
    let name = encoder.name()?;
    if !ctx.ffmpeg.has_encoder(&name) {
        warn!(encoder = %name, "hardware encoder not compiled into ffmpeg");
        return None;
    }
    if let RequiredLocation::Hardware(surface) = encoder.required_location() {
        let target = ctx.desired_format();
        if surface.upload_format(target) != target {
            debug!(%target, "target pixel format cannot live on the device");
            return None;
        }
    }
    Some(encoder)
}

fn declare_hardware<'a>(backend: &dyn BackendPipeline, mut ctx: BuildContext<'a>) -> BuildContext<'a> {
    let mode = backend.mode();
    if !mode.is_hardware() || ctx.is_copy() {
        return ctx;
    }
    if !ctx.ffmpeg.has_hardware_acceleration(mode) {
        warn!(%mode, "hardware acceleration not available in ffmpeg, using software");
        return ctx;
    }

    // burning text needs host frames; without other filters a device
    // round trip buys nothing
    let text_only =
        ctx.subtitle_method() == Some(SubtitleMethod::Burn) && !ctx.needs_frame_filters();
    ctx.hardware_decode = !ctx.options.disable_hardware_decoding
        && !text_only
        && ctx.hardware.can_decode(
            ctx.current.video_format,
            ctx.current.video_profile.as_deref(),
            ctx.current.pixel_format,
        );
    ctx.hardware_encode =
        !ctx.options.disable_hardware_encoding && hardware_encoder(backend, &ctx).is_some();

    if ctx.hardware_decode {
        ctx.ffmpeg_state.decoder_hw_accel_mode = mode;
    }
    if ctx.hardware_encode {
        ctx.ffmpeg_state.encoder_hw_accel_mode = mode;
    }
    info!(
        %mode,
        decode = ctx.hardware_decode,
        encode = ctx.hardware_encode,
        "hardware acceleration decided"
    );
    if ctx.hardware_decode || ctx.hardware_encode {
        let option = HardwareAccelerationOption {
            mode,
            decode: ctx.hardware_decode,
            device: backend.device(&ctx.ffmpeg_state),
        };
        ctx.apply_step(PipelineStep::Global(GlobalOption::HardwareAcceleration(option)));
    }
    ctx
}

fn attach_decoder<'a>(backend: &dyn BackendPipeline, mut ctx: BuildContext<'a>) -> BuildContext<'a> {
    if !ctx.is_copy() {
        let decoder = if ctx.hardware_decode {
            backend.decoder(&ctx)
        } else {
            Decoder::Implicit
        };
        debug!(?decoder, "selected decoder");
        ctx.apply_step(PipelineStep::Input(InputOption::Decoder(decoder)));
    }
    ctx.decoded_state = Some(ctx.current.clone());
    ctx
}

/// First device-side variant whose filter is usable.
fn device_kind<K>(ctx: &BuildContext<'_>, candidate: Option<(K, &'static str)>) -> Option<K> {
    candidate
        .filter(|(_, name)| ctx.device_filter_usable(name))
        .map(|(kind, _)| kind)
}

/// Device variant for a deinterlace, tonemap or scale. Frames in host
/// memory stay there while a host-only filter is still to come, so they
/// are uploaded at most once.
fn frame_filter_kind<K>(
    backend: &dyn BackendPipeline,
    ctx: &BuildContext<'_>,
    candidate: Option<(K, &'static str)>,
) -> Option<K> {
    if candidate.is_some() && !ctx.current.is_hardware() && host_filter_follows(backend, ctx) {
        debug!("host-only filter follows, keeping frames in host memory");
        return None;
    }
    device_kind(ctx, candidate)
}

/// Crop size still to apply.
fn pending_crop(ctx: &BuildContext<'_>) -> Option<FrameSize> {
    ctx.desired
        .cropped_size
        .filter(|size| ctx.current.cropped_size != Some(*size))
}

/// A crop, or a pad the backend can only run in software.
fn host_filter_follows(backend: &dyn BackendPipeline, ctx: &BuildContext<'_>) -> bool {
    if pending_crop(ctx).is_some() {
        return true;
    }
    let framed = if ctx.needs_scale() {
        ctx.desired.scaled_size
    } else {
        ctx.current.padded_size
    };
    framed != ctx.desired.padded_size && backend.pad_kind(ctx) == PadKind::Software
}

fn deinterlace<'a>(backend: &dyn BackendPipeline, mut ctx: BuildContext<'a>) -> BuildContext<'a> {
    if !ctx.current.deinterlace {
        return ctx;
    }
    let surface = backend.surface();
    let kind = frame_filter_kind(backend, &ctx, surface.and_then(DeinterlaceKind::for_surface))
        .unwrap_or_else(|| {
            DeinterlaceKind::Software(ctx.ffmpeg_state.software_deinterlace_filter.clone())
        });
    debug!(?kind, "deinterlacing");
    ctx.push_video_filter(VideoFilter::Deinterlace(DeinterlaceFilter { kind }), surface);
    ctx
}

fn tonemap<'a>(backend: &dyn BackendPipeline, mut ctx: BuildContext<'a>) -> BuildContext<'a> {
    let is_hdr = ctx.current.color_format.as_ref().is_some_and(|c| c.is_hdr());
    if !ctx.options.tonemap_hdr || !is_hdr {
        return ctx;
    }
    let surface = backend.surface();
    let kind = match frame_filter_kind(backend, &ctx, surface.and_then(TonemapKind::for_surface)) {
        Some(kind) => kind,
        None if ctx.ffmpeg.has_filter("zscale") && ctx.ffmpeg.has_filter("tonemap") => {
            TonemapKind::Software
        }
        None => {
            warn!("no tonemap filter available, passing HDR through");
            return ctx;
        }
    };
    debug!(?kind, "tonemapping to bt709");
    let format = ctx.desired_format();
    ctx.push_video_filter(VideoFilter::Tonemap(TonemapFilter { kind, format }), surface);
    ctx
}

fn scale<'a>(backend: &dyn BackendPipeline, mut ctx: BuildContext<'a>) -> BuildContext<'a> {
    if !ctx.needs_scale() {
        return ctx;
    }
    let surface = backend.surface();
    let kind = frame_filter_kind(backend, &ctx, surface.and_then(ScaleKind::for_surface))
        .unwrap_or_else(|| ScaleKind::Software {
            algorithm: ctx.ffmpeg_state.software_scaling_algorithm.clone(),
        });
    let size = ctx.desired.scaled_size;
    debug!(?kind, %size, "scaling");
    ctx.push_video_filter(VideoFilter::Scale(ScaleFilter { kind, size }), surface);
    ctx
}

fn crop(mut ctx: BuildContext<'_>) -> BuildContext<'_> {
    if let Some(size) = pending_crop(&ctx) {
        debug!(%size, "cropping");
        ctx.push_video_filter(VideoFilter::Crop(CropFilter { size }), None);
    }
    ctx
}

fn pad<'a>(backend: &dyn BackendPipeline, mut ctx: BuildContext<'a>) -> BuildContext<'a> {
    if ctx.current.padded_size == ctx.desired.padded_size {
        return ctx;
    }
    let kind = backend.pad_kind(&ctx);
    let size = ctx.desired.padded_size;
    debug!(?kind, %size, "padding");
    ctx.push_video_filter(VideoFilter::Pad(PadFilter { kind, size }), backend.surface());
    ctx
}

/// Decided once so subtitle and watermark overlays agree on where frames
/// live.
fn choose_overlay<'a>(backend: &dyn BackendPipeline, mut ctx: BuildContext<'a>) -> BuildContext<'a> {
    let method = ctx.subtitle_method();
    if ctx.watermark.is_none() && method != Some(SubtitleMethod::Overlay) {
        return ctx;
    }
    let hardware = backend.surface().and_then(OverlayKind::for_surface).filter(|kind| {
        ctx.current.is_hardware()
            && !ctx.options.disable_hardware_filters
            && method != Some(SubtitleMethod::Burn)
            && ctx.ffmpeg_state.version.at_least(HARDWARE_OVERLAY_MIN_MAJOR, 0)
            && ctx.ffmpeg.has_filter(kind.filter_name())
            && !backend.force_software_overlay(&ctx)
    });
    let kind = hardware.unwrap_or(OverlayKind::Software);
    debug!(?kind, "overlay");
    ctx.overlay = Some(kind);
    ctx
}

/// Move the main video to where the overlay runs.
fn prepare_overlay(backend: &dyn BackendPipeline, ctx: &mut BuildContext<'_>, kind: OverlayKind) {
    match (kind, backend.surface()) {
        (OverlayKind::Software, _) | (_, None) => ctx.ensure_software(),
        (_, Some(surface)) => ctx.ensure_hardware(surface),
    }
}

/// Upload an overlay input for a device-side overlay.
fn overlay_upload(
    backend: &dyn BackendPipeline,
    ctx: &BuildContext<'_>,
    kind: OverlayKind,
) -> Option<VideoFilter> {
    if kind == OverlayKind::Software {
        return None;
    }
    backend.surface().map(|surface| {
        VideoFilter::HardwareUpload(HardwareUploadFilter {
            surface,
            format: SoftwarePixelFormat::Yuva420p,
            extra_frames: ctx.ffmpeg_state.qsv_extra_hardware_frames,
        })
    })
}

fn subtitles<'a>(backend: &dyn BackendPipeline, mut ctx: BuildContext<'a>) -> BuildContext<'a> {
    let Some(method) = ctx.subtitle_method() else {
        return ctx;
    };
    match method {
        SubtitleMethod::Burn => {
            let Some(subtitle) = ctx.subtitle.as_ref() else {
                return ctx;
            };
            let filter = SubtitlesFilter {
                path: subtitle.core.locator.clone(),
                ordinal: subtitle.ordinal,
            };
            debug!(path = %filter.path, "burning in text subtitles");
            ctx.apply_step(PipelineStep::Input(InputOption::CopyTimestamps));
            ctx.push_video_filter(VideoFilter::Subtitles(filter), None);
        }
        SubtitleMethod::Overlay => {
            let kind = ctx.overlay.unwrap_or(OverlayKind::Software);
            let frame = ctx.current.padded_size;
            let algorithm = ctx.ffmpeg_state.software_scaling_algorithm.clone();
            let upload = overlay_upload(backend, &ctx, kind);
            if let Some(subtitle) = ctx.subtitle.as_mut() {
                if subtitle.stream.frame_size.is_some_and(|size| size != frame) {
                    subtitle
                        .filters
                        .push(VideoFilter::Scale(ScaleFilter::software(&algorithm, frame)));
                }
                subtitle.filters.extend(upload);
            }
            prepare_overlay(backend, &mut ctx, kind);
            ctx.chain.subtitle_overlay.push(VideoFilter::Overlay(OverlayFilter {
                kind,
                position: OverlayPosition::Centered,
            }));
        }
    }
    ctx
}

fn watermark<'a>(backend: &dyn BackendPipeline, mut ctx: BuildContext<'a>) -> BuildContext<'a> {
    let Some(mut watermark) = ctx.watermark.take() else {
        return ctx;
    };
    let kind = ctx.overlay.unwrap_or(OverlayKind::Software);
    let frame = ctx.current.padded_size;
    watermark.filters = watermark.filters_for(frame);
    watermark.filters.extend(overlay_upload(backend, &ctx, kind));
    let options = &watermark.watermark;
    let position = OverlayPosition::corner(
        options.location,
        options.horizontal_margin_percent,
        options.vertical_margin_percent,
        frame,
    );
    debug!(?kind, ?position, "overlaying watermark");
    ctx.watermark = Some(watermark);
    prepare_overlay(backend, &mut ctx, kind);
    ctx.chain
        .watermark_overlay
        .push(VideoFilter::Overlay(OverlayFilter { kind, position }));
    ctx
}

fn attach_encoder<'a>(backend: &dyn BackendPipeline, mut ctx: BuildContext<'a>) -> BuildContext<'a> {
    let encoder = if ctx.is_copy() {
        VideoEncoder::Copy
    } else if ctx.hardware_encode {
        hardware_encoder(backend, &ctx)
            .unwrap_or_else(|| VideoEncoder::software(ctx.desired.video_format, ctx.ffmpeg))
    } else {
        VideoEncoder::software(ctx.desired.video_format, ctx.ffmpeg)
    };
    debug!(encoder = ?encoder.name(), "selected video encoder");
    ctx.encoder = Some(encoder.clone());
    ctx.apply_step(PipelineStep::Output(OutputOption::VideoEncoder(encoder)));
    ctx
}

/// Converge the frames handed to the encoder on the desired pixel format,
/// in the memory the encoder reads from.
fn reconcile_pixel_format(mut ctx: BuildContext<'_>) -> BuildContext<'_> {
    let Some(encoder) = ctx.encoder.clone() else {
        return ctx;
    };
    let target = ctx.desired_format();
    match encoder.required_location() {
        RequiredLocation::Any => {}
        RequiredLocation::Software => {
            if ctx.current.is_hardware()
                && let Some(format) = ctx.current.pixel_format
            {
                ctx.push_pixel_format_filter(VideoFilter::HardwareDownload(
                    HardwareDownloadFilter { format },
                ));
            }
            if current_layout(&ctx.current) == target {
                debug!(%target, "pixel format already matches");
            } else if ctx.has_graph() {
                debug!(%target, "converting pixel format in the graph");
                ctx.push_pixel_format_filter(VideoFilter::PixelFormat(PixelFormatFilter {
                    format: target,
                }));
            } else {
                debug!(%target, "converting pixel format at the encoder");
                ctx.apply_step(PipelineStep::Output(OutputOption::PixelFormat(target.into())));
                ctx.current = FrameState {
                    pixel_format: Some(target.into()),
                    ..ctx.current
                };
            }
        }
        RequiredLocation::Hardware(surface) => {
            let on_device = ctx.current.pixel_format.and_then(|p| p.surface());
            if ctx.current.is_hardware()
                && on_device != Some(surface)
                && let Some(format) = ctx.current.pixel_format
            {
                ctx.push_pixel_format_filter(VideoFilter::HardwareDownload(
                    HardwareDownloadFilter { format },
                ));
            }
            if ctx.current.is_hardware() {
                if current_layout(&ctx.current) != target {
                    debug!(%target, "converting pixel format on the device");
                    ctx.push_pixel_format_filter(VideoFilter::HardwareFormat(
                        HardwareFormatFilter {
                            surface,
                            format: target,
                        },
                    ));
                }
            } else {
                if current_layout(&ctx.current) != target {
                    ctx.push_pixel_format_filter(VideoFilter::PixelFormat(PixelFormatFilter {
                        format: target,
                    }));
                }
                debug!(%target, ?surface, "uploading for hardware encoder");
                ctx.push_pixel_format_filter(VideoFilter::HardwareUpload(HardwareUploadFilter {
                    surface,
                    format: target,
                    extra_frames: ctx.ffmpeg_state.qsv_extra_hardware_frames,
                }));
            }
        }
    }
    ctx
}

fn current_layout(state: &FrameState) -> SoftwarePixelFormat {
    state
        .pixel_format
        .as_ref()
        .map(PixelFormat::unwrap)
        .unwrap_or(SoftwarePixelFormat::Yuv420p)
}

fn outputs<'a>(backend: &dyn BackendPipeline, mut ctx: BuildContext<'a>) -> BuildContext<'a> {
    if ctx.desired.realtime {
        ctx.apply_step(PipelineStep::Input(InputOption::Realtime));
    }
    if let Some(start) = ctx.ffmpeg_state.start.filter(|s| !s.is_zero()) {
        ctx.apply_step(PipelineStep::Input(InputOption::Seek(start)));
    }
    if ctx.desired.infinite_loop {
        ctx.apply_step(PipelineStep::Input(InputOption::InfiniteLoop));
    }

    if !ctx.is_copy() {
        for option in video_options(&ctx) {
            ctx.apply_step(PipelineStep::Output(option));
        }
    }

    if ctx.audio.is_some() {
        let state = ctx.audio_state.clone();
        ctx.apply_step(PipelineStep::Output(OutputOption::AudioEncoder(AudioEncoder::new(
            state.audio_encoder,
        ))));
        if state.audio_encoder != AudioFormat::Copy {
            let options = [
                state.audio_channels.map(OutputOption::AudioChannels),
                state.audio_bitrate.map(OutputOption::AudioBitrate),
                state.audio_buffer_size.map(OutputOption::AudioBufferSize),
                state.audio_sample_rate.map(OutputOption::AudioSampleRate),
            ];
            for option in options.into_iter().flatten() {
                ctx.apply_step(PipelineStep::Output(option));
            }
            let mut filters = vec![AudioFilter::Resample];
            if state.needs_volume_filter() {
                filters.extend(state.audio_volume.map(AudioFilter::Volume));
            }
            filters.extend(state.audio_duration.map(AudioFilter::Pad));
            if let Some(audio) = ctx.audio.as_mut() {
                audio.filters = filters;
            }
        }
    }

    let decoration = decoration_steps(&ctx.ffmpeg_state, ctx.desired.video_track_timescale);
    ctx.steps.extend(decoration);
    let format = ctx.ffmpeg_state.output_format.clone();
    ctx.apply_step(PipelineStep::Output(OutputOption::Format(format)));

    let complex = complex_filter(&ctx);
    ctx.apply_step(PipelineStep::Filter(complex));

    let uses_driver =
        backend.uses_vaapi_driver() && (ctx.hardware_decode || ctx.hardware_encode);
    for variable in environment::for_state(&ctx.ffmpeg_state, uses_driver) {
        ctx.apply_step(PipelineStep::Environment(variable));
    }
    ctx
}

fn video_options(ctx: &BuildContext<'_>) -> Vec<OutputOption> {
    let desired = &ctx.desired;
    let mut options = Vec::new();
    if let Some(rate) = desired.frame_rate {
        options.push(OutputOption::FrameRate(rate));
    }
    if let Some(timescale) = desired.video_track_timescale {
        options.push(OutputOption::VideoTrackTimescale(timescale));
    }
    if let Some(bitrate) = desired.video_bitrate {
        options.push(OutputOption::VideoBitrate(bitrate));
    }
    if let Some(buffer) = desired.video_buffer_size {
        options.push(OutputOption::VideoBufferSize(buffer));
    }
    // the tool-chosen encoder may not accept the profile name
    let named = ctx.encoder.as_ref().and_then(|e| e.name()).is_some();
    if let Some(profile) = desired.video_profile.as_ref().filter(|_| named) {
        options.push(OutputOption::VideoProfile(profile.clone()));
    }
    if let Some(preset) = &desired.video_preset
        && ctx.encoder.as_ref().is_some_and(|e| e.supports_preset())
    {
        options.push(OutputOption::VideoPreset(preset.clone()));
    }
    if let OutputFormat::Hls(hls) = &ctx.ffmpeg_state.output_format {
        let rate = desired.frame_rate.or(ctx.current.frame_rate).unwrap_or(30.0);
        options.push(OutputOption::KeyFrames {
            gop: hls_gop_size(rate, hls.hls_time, hls.one_second_gop),
            segment_seconds: hls.hls_time,
        });
    }
    options
}

/// Graph and maps over the inputs, indexed the way the command line will
/// open them.
fn complex_filter(ctx: &BuildContext<'_>) -> ComplexFilter {
    let subtitle = ctx
        .subtitle
        .as_ref()
        .filter(|s| s.method() == SubtitleMethod::Overlay);
    let mut sources: Vec<&dyn InputSource> = vec![&ctx.video];
    if let Some(audio) = &ctx.audio {
        sources.push(audio);
    }
    if let Some(watermark) = &ctx.watermark {
        sources.push(watermark);
    }
    if let Some(subtitle) = subtitle {
        sources.push(subtitle);
    }
    let (_, indices) = group_inputs(&sources);

    let mut next = indices.iter().copied();
    let video_index = next.next().unwrap_or(0);
    let audio = ctx
        .audio
        .as_ref()
        .map(|audio| (next.next().unwrap_or(0), audio));
    let watermark = ctx
        .watermark
        .as_ref()
        .map(|watermark| (next.next().unwrap_or(0), watermark));
    let subtitle = subtitle.map(|subtitle| (next.next().unwrap_or(0), subtitle));

    ComplexFilter::assemble(
        GraphInputs {
            video: (video_index, &ctx.video),
            audio,
            watermark,
            subtitle,
        },
        &ctx.chain,
    )
}
