//! System tray menu and icon
//!
//! The tray only reads the session's current level and forwards user picks
//! to the session loop; it never touches the display itself.

use ksni::menu::{CheckmarkItem, StandardItem};
use ksni::{Icon, MenuItem, ToolTip};
use std::f32::consts::TAU;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::constants::{levels, tray};
use crate::event_handler::SessionEvent;
use crate::ramp::menu_levels;

pub struct BrightnessTray {
    level: u8,
    min_level: u8,
    events: UnboundedSender<SessionEvent>,
}

impl BrightnessTray {
    pub fn new(level: u8, min_level: u8, events: UnboundedSender<SessionEvent>) -> Self {
        Self {
            level,
            min_level,
            events,
        }
    }

    /// Mirror the level the session actually applied
    pub fn set_level(&mut self, level: u8) {
        self.level = level;
    }

    fn send(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            warn!(?event, "Session loop is gone, dropping tray command");
        }
    }
}

impl ksni::Tray for BrightnessTray {
    fn id(&self) -> String {
        tray::ID.to_string()
    }

    fn title(&self) -> String {
        format!("{} ({}%)", tray::TITLE, self.level)
    }

    fn icon_pixmap(&self) -> Vec<Icon> {
        vec![sun_icon(self.level)]
    }

    fn tool_tip(&self) -> ToolTip {
        ToolTip {
            title: tray::TITLE.to_string(),
            description: format!("Brightness {}%", self.level),
            ..Default::default()
        }
    }

    fn menu(&self) -> Vec<MenuItem<Self>> {
        let mut items: Vec<MenuItem<Self>> = menu_levels(self.min_level)
            .map(|level| {
                CheckmarkItem {
                    label: format!("{level}%"),
                    checked: self.level == level,
                    activate: Box::new(move |this: &mut Self| this.send(SessionEvent::SetLevel(level))),
                    ..Default::default()
                }
                .into()
            })
            .collect();

        items.push(MenuItem::Separator);
        items.push(
            StandardItem {
                label: "Restore Default".to_string(),
                activate: Box::new(|this: &mut Self| this.send(SessionEvent::RestoreDefault)),
                ..Default::default()
            }
            .into(),
        );
        items.push(
            StandardItem {
                label: "Exit".to_string(),
                icon_name: "application-exit".to_string(),
                activate: Box::new(|this: &mut Self| this.send(SessionEvent::Exit)),
                ..Default::default()
            }
            .into(),
        );
        items
    }
}

/// Sun glyph whose yellow dims with `level`, as ARGB32
pub fn sun_icon(level: u8) -> Icon {
    let size = tray::ICON_SIZE;
    let shade = (255 * u32::from(level.min(levels::FULL)) / u32::from(levels::FULL)) as u8;
    let center = size as f32 / 2.0;
    let radius = center - tray::SUN_MARGIN;

    let rays: Vec<((f32, f32), (f32, f32))> = (0..tray::RAY_COUNT)
        .map(|k| {
            let (sin, cos) = (k as f32 * TAU / tray::RAY_COUNT as f32).sin_cos();
            let outer = radius + tray::RAY_LENGTH;
            (
                (center + radius * cos, center + radius * sin),
                (center + outer * cos, center + outer * sin),
            )
        })
        .collect();

    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let p = (x as f32 + 0.5, y as f32 + 0.5);
            let in_disc = distance(p, (center, center)) <= radius;
            let on_ray = rays
                .iter()
                .any(|&(a, b)| distance_to_segment(p, a, b) <= tray::RAY_HALF_WIDTH);
            if in_disc || on_ray {
                data.extend_from_slice(&[0xFF, shade, shade, 0]);
            } else {
                data.extend_from_slice(&[0, 0, 0, 0]);
            }
        }
    }

    Icon {
        width: size,
        height: size,
        data,
    }
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

fn distance_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return distance(p, a);
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    distance(p, (a.0 + t * dx, a.1 + t * dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ksni::Tray;
    use tokio::sync::mpsc;

    fn pixel(icon: &Icon, x: i32, y: i32) -> [u8; 4] {
        let i = ((y * icon.width + x) * 4) as usize;
        [icon.data[i], icon.data[i + 1], icon.data[i + 2], icon.data[i + 3]]
    }

    #[test]
    fn test_icon_dimensions() {
        let icon = sun_icon(100);
        assert_eq!(icon.width, 64);
        assert_eq!(icon.height, 64);
        assert_eq!(icon.data.len(), 64 * 64 * 4);
    }

    #[test]
    fn test_icon_dims_with_level() {
        assert_eq!(pixel(&sun_icon(100), 32, 32), [0xFF, 255, 255, 0]);
        assert_eq!(pixel(&sun_icon(50), 32, 32), [0xFF, 127, 127, 0]);
        assert_eq!(pixel(&sun_icon(10), 32, 32), [0xFF, 25, 25, 0]);
    }

    #[test]
    fn test_icon_background_transparent() {
        let icon = sun_icon(100);
        assert_eq!(pixel(&icon, 0, 0), [0, 0, 0, 0]);
        assert_eq!(pixel(&icon, 63, 63), [0, 0, 0, 0]);
    }

    #[test]
    fn test_icon_has_rays() {
        let icon = sun_icon(100);
        // On the horizontal ray, outside the disc
        assert_eq!(pixel(&icon, 53, 32)[0], 0xFF);
        // Past the ray tip
        assert_eq!(pixel(&icon, 60, 32)[0], 0);
    }

    #[test]
    fn test_menu_lists_levels_and_actions() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let tray = BrightnessTray::new(100, 10, tx.clone());
        assert_eq!(tray.menu().len(), 10 + 3);

        let floored = BrightnessTray::new(100, 50, tx);
        assert_eq!(floored.menu().len(), 6 + 3);
    }

    #[test]
    fn test_menu_checks_current_level() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut tray = BrightnessTray::new(100, 10, tx);
        tray.set_level(70);

        let checked: Vec<String> = tray
            .menu()
            .into_iter()
            .filter_map(|item| match item {
                MenuItem::Checkmark(item) if item.checked => Some(item.label),
                _ => None,
            })
            .collect();
        assert_eq!(checked, vec!["70%".to_string()]);
        assert_eq!(tray.title(), "Gamma Dim (70%)");
    }

    #[test]
    fn test_send_forwards_to_session() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tray = BrightnessTray::new(100, 10, tx);
        tray.send(SessionEvent::SetLevel(30));
        tray.send(SessionEvent::Exit);
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::SetLevel(30));
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Exit);
    }

    #[test]
    fn test_send_after_session_ended() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let tray = BrightnessTray::new(100, 10, tx);
        // Logged, not panicking
        tray.send(SessionEvent::RestoreDefault);
    }
}
