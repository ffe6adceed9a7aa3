use iced::alignment::Horizontal;
use iced::widget::{container, mouse_area, text, Column, Container, Stack};
use iced::{Color, Element, Length, Padding};

use crate::frontend::message::Message;
use crate::frontend::overlay::OverlayLabel;

/// `rrggbb` or `#rrggbb`. Anything else is `None`.
pub fn parse_colour(hex: &str) -> Option<Color> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::from_rgb8(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Opacity of the overlay while the pointer is over it.
const HOVER_OPACITY: f32 = 0.1;
const BACKGROUND_OPACITY: f32 = 0.55;
const SHADOW_OFFSET: f32 = 1.0;

/// How opaque the overlay is drawn. Only fades when the user asked for it.
pub fn overlay_opacity(hovered: bool, hide_with_mouse: bool) -> f32 {
    if hovered && hide_with_mouse { HOVER_OPACITY } else { 1.0 }
}

pub fn faded(colour: Color, opacity: f32) -> Color {
    Color { a: colour.a * opacity, ..colour }
}

pub struct OverlayStyle {
    pub font_size: u16,
    pub colour: Color,
    pub shadow: Color,
    pub opacity: f32
}

pub struct LyricbarWidget;
impl LyricbarWidget {
    /// One lyric row drawn over a copy of itself in the shadow colour.
    fn shadowed<'a>(content: &'a str, style: &OverlayStyle) -> Element<'a, Message> {
        let shadow = container(text(content).size(style.font_size).color(faded(style.shadow, style.opacity)))
            .padding(Padding { top: SHADOW_OFFSET, right: 0.0, bottom: 0.0, left: SHADOW_OFFSET });

        Stack::new()
            .push(shadow)
            .push(text(content).size(style.font_size).color(faded(style.colour, style.opacity)))
            .into()
    }

    pub fn overlay<'a>(labels: &'a [OverlayLabel], style: OverlayStyle) -> Element<'a, Message> {
        let rows = labels.iter().fold(
            Column::new().spacing(style.font_size / 3).align_x(Horizontal::Center),
            |column, label| column.push(Self::shadowed(&label.text, &style))
        );

        let padding = f32::from(style.font_size);
        let background = faded(Color { a: BACKGROUND_OPACITY, ..Color::BLACK }, style.opacity);
        let panel = container(rows)
            .padding([padding / 3.0, padding])
            .style(move |_| container::Style {
                background: Some(background.into()),
                border: iced::border::rounded(padding / 2.0),
                ..container::Style::default()
            });

        Container::new(
            mouse_area(panel)
                .on_enter(Message::OverlayHovered(true))
                .on_exit(Message::OverlayHovered(false))
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
    }
}
