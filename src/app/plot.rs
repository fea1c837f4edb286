//! Small line graphs for history series.

use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, StrokeKind, Ui, vec2};
use ndarray::Array1;
use physlab::simulation::history::value_range;

const PLOT_HEIGHT: f32 = 110.0;
const FRAME_COLOUR: Color32 = Color32::from_rgb(60, 60, 60);

pub struct Trace<'a> {
    pub label: &'a str,
    pub values: Array1<f64>,
    pub colour: Color32,
}

/// Plots every trace against `times` on shared axes.
pub fn line_plot(ui: &mut Ui, title: &str, times: &Array1<f64>, traces: &[Trace<'_>]) {
    ui.label(title);
    let (rect, _) = ui.allocate_exact_size(vec2(ui.available_width(), PLOT_HEIGHT), Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_stroke(rect, 2.0, Stroke::new(1.0, FRAME_COLOUR), StrokeKind::Inside);

    let Some((t_min, t_max)) = value_range(times) else {
        return;
    };
    let ranges: Vec<(f64, f64)> = traces.iter().filter_map(|t| value_range(&t.values)).collect();
    let Some((mut y_min, mut y_max)) = ranges
        .iter()
        .copied()
        .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)))
    else {
        return;
    };
    if (y_max - y_min).abs() < 1e-9 {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let t_span = (t_max - t_min).max(1e-9);

    let to_screen = |t: f64, v: f64| -> Pos2 {
        let x = rect.left() + ((t - t_min) / t_span) as f32 * rect.width();
        let y = rect.bottom() - ((v - y_min) / (y_max - y_min)) as f32 * rect.height();
        Pos2::new(x, y)
    };

    for (row, trace) in traces.iter().enumerate() {
        if trace.values.len() != times.len() {
            log::error!("Trace {} has {} values for {} times", trace.label, trace.values.len(), times.len());
            continue;
        }
        let points: Vec<Pos2> = times
            .iter()
            .zip(trace.values.iter())
            .filter(|(_, v)| v.is_finite())
            .map(|(t, v)| to_screen(*t, *v))
            .collect();
        if points.len() >= 2 {
            painter.line(points, Stroke::new(1.5, trace.colour));
        }
        painter.text(
            rect.left_top() + vec2(6.0, 4.0 + 14.0 * row as f32),
            Align2::LEFT_TOP,
            trace.label,
            FontId::proportional(11.0),
            trace.colour,
        );
    }
    painter.text(
        rect.right_top() + vec2(-4.0, 4.0),
        Align2::RIGHT_TOP,
        format!("{y_max:.2}"),
        FontId::monospace(10.0),
        Color32::GRAY,
    );
    painter.text(
        rect.right_bottom() + vec2(-4.0, -4.0),
        Align2::RIGHT_BOTTOM,
        format!("{y_min:.2}"),
        FontId::monospace(10.0),
        Color32::GRAY,
    );
}

/// Horizontal bars, one per value, scaled to the largest magnitude.
pub fn bar_chart(ui: &mut Ui, bars: &[(String, f64, Color32)]) {
    let height = 18.0 * bars.len().max(1) as f32;
    let (rect, _) = ui.allocate_exact_size(vec2(ui.available_width(), height), Sense::hover());
    let painter = ui.painter_at(rect);
    let largest = bars.iter().map(|b| b.1.abs()).fold(0.0, f64::max).max(1e-9);
    for (row, (label, value, colour)) in bars.iter().enumerate() {
        let top = rect.top() + 18.0 * row as f32;
        let width = (value.abs() / largest) as f32 * rect.width() * 0.6;
        let bar = Rect::from_min_size(Pos2::new(rect.left(), top + 2.0), vec2(width, 14.0));
        painter.rect_filled(bar, 2.0, *colour);
        painter.text(
            Pos2::new(rect.left() + width + 6.0, top + 9.0),
            Align2::LEFT_CENTER,
            format!("{label}: {value:.3}"),
            FontId::proportional(11.0),
            Color32::LIGHT_GRAY,
        );
    }
}
