use indicatif::ProgressStyle;
use tracing::{info_span, Span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

/// Bar style for batch progress, or `None` if the template fails to parse
pub fn progress_style() -> Option<ProgressStyle> {
    Some(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise} / {eta_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
            .ok()?
            .progress_chars("##-")
    )
}

/// A span that the indicatif layer renders as a bar of `len` steps.
///
/// Log lines emitted while the span is open are printed above the bar
/// instead of through it. Without the layer installed the span is inert.
pub fn progress_span(len: u64, msg: &str) -> Span {
    let span = info_span!("progress", indicatif.pb_show = true);

    if let Some(style) = progress_style() {
        span.pb_set_style(&style);
    }
    span.pb_set_length(len);
    span.pb_set_message(msg);

    span
}
