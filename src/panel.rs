use crate::color::Color;
use crate::params::{ParamValue, Parameter, ParameterChanged};
use crate::GalaxyParams;
use egui::{CollapsingHeader, RichText, Slider};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

const HUE_STEP_DEGREES: f32 = 10.0;
const COARSE_STEPS: f32 = 10.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PanelAction {
  Next,
  Previous,
  Increase,
  Decrease,
  IncreaseCoarse,
  DecreaseCoarse,
  Reset,
}

pub fn key_action(key: KeyCode, shift: bool) -> Option<PanelAction> {
  match key {
    KeyCode::Tab if shift => Some(PanelAction::Previous),
    KeyCode::Tab => Some(PanelAction::Next),
    KeyCode::ArrowUp | KeyCode::Equal | KeyCode::NumpadAdd => Some(PanelAction::Increase),
    KeyCode::ArrowDown | KeyCode::Minus | KeyCode::NumpadSubtract => Some(PanelAction::Decrease),
    KeyCode::PageUp => Some(PanelAction::IncreaseCoarse),
    KeyCode::PageDown => Some(PanelAction::DecreaseCoarse),
    KeyCode::KeyR => Some(PanelAction::Reset),
    _ => None,
  }
}

/// Debug panel with one control per galaxy parameter, grouped in a "Galaxy"
/// folder. Drawn with egui; the keyboard shortcuts act on the focused control.
pub struct DebugPanel {
  folder: &'static str,
  controls: Vec<Parameter>,
  focused: usize,
  defaults: GalaxyParams,
  modifiers: ModifiersState,
}

impl DebugPanel {
  /// `defaults` are the values `Reset` restores.
  pub fn new(defaults: GalaxyParams) -> Self {
    Self {
      folder: "Galaxy",
      controls: Parameter::ALL.to_vec(),
      focused: 0,
      defaults,
      modifiers: ModifiersState::empty(),
    }
  }

  pub fn focused(&self) -> Parameter {
    self.controls[self.focused]
  }

  pub fn process_events(&mut self, event: &WindowEvent) -> Option<PanelAction> {
    match event {
      WindowEvent::ModifiersChanged(modifiers) => {
        self.modifiers = modifiers.state();
        None
      }
      WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            state: ElementState::Pressed,
            physical_key: PhysicalKey::Code(keycode),
            ..
          },
        ..
      } => key_action(*keycode, self.modifiers.shift_key()),
      _ => None,
    }
  }

  /// Navigation changes the focus only; value actions yield the change to
  /// dispatch.
  pub fn apply(&mut self, action: PanelAction, params: &GalaxyParams) -> Option<ParameterChanged> {
    let n = self.controls.len();
    let steps = match action {
      PanelAction::Next => {
        self.focused = (self.focused + 1) % n;
        return None;
      }
      PanelAction::Previous => {
        self.focused = (self.focused + n - 1) % n;
        return None;
      }
      PanelAction::Reset => {
        let parameter = self.focused();
        return Some(ParameterChanged {
          parameter,
          value: self.defaults.get(parameter),
        });
      }
      PanelAction::Increase => 1.0,
      PanelAction::Decrease => -1.0,
      PanelAction::IncreaseCoarse => COARSE_STEPS,
      PanelAction::DecreaseCoarse => -COARSE_STEPS,
    };

    let parameter = self.focused();
    match (params.get(parameter), parameter.range()) {
      (ParamValue::Scalar(v), Some(range)) => Some(ParameterChanged::scalar(
        parameter,
        range.clamp(v + steps * range.step),
      )),
      (ParamValue::Color(c), _) => Some(ParameterChanged::color(
        parameter,
        c.shift_hue(steps * HUE_STEP_DEGREES),
      )),
      _ => None,
    }
  }

  /// Draw the panel and return the edits made this frame.
  pub fn show(&mut self, ctx: &egui::Context, params: &GalaxyParams) -> Vec<ParameterChanged> {
    let mut changes = Vec::new();
    egui::Window::new("Debug")
      .resizable(false)
      .default_width(300.0)
      .show(ctx, |ui| {
        CollapsingHeader::new(self.folder)
          .default_open(true)
          .show(ui, |ui| {
            for (index, &parameter) in self.controls.iter().enumerate() {
              let focused = index == self.focused;
              let edited = ui
                .horizontal(|ui| control(ui, parameter, params.get(parameter), focused))
                .inner;
              if let Some(change) = edited {
                self.focused = index;
                changes.push(change);
              }
            }
          });
      });
    changes
  }

  pub fn title(&self, params: &GalaxyParams) -> String {
    let parameter = self.focused();
    format!(
      "{} [{}/{}] {}: {}",
      self.folder,
      self.focused + 1,
      self.controls.len(),
      parameter,
      params.get(parameter)
    )
  }
}

fn control(
  ui: &mut egui::Ui,
  parameter: Parameter,
  value: ParamValue,
  focused: bool,
) -> Option<ParameterChanged> {
  let label = RichText::new(parameter.name());
  ui.label(if focused { label.strong() } else { label });
  match (value, parameter.range()) {
    (ParamValue::Scalar(mut v), Some(range)) => {
      let slider = Slider::new(&mut v, range.min..=range.max).step_by(range.step as f64);
      ui.add(slider)
        .changed()
        .then(|| ParameterChanged::scalar(parameter, v))
    }
    (ParamValue::Color(color), _) => {
      let mut rgb = color.to_rgb8();
      ui.color_edit_button_srgb(&mut rgb)
        .changed()
        .then(|| ParameterChanged::color(parameter, Color::from_rgb8(rgb[0], rgb[1], rgb[2])))
    }
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keys_map_to_actions() {
    assert_eq!(key_action(KeyCode::Tab, false), Some(PanelAction::Next));
    assert_eq!(key_action(KeyCode::Tab, true), Some(PanelAction::Previous));
    assert_eq!(key_action(KeyCode::ArrowUp, false), Some(PanelAction::Increase));
    assert_eq!(key_action(KeyCode::Minus, false), Some(PanelAction::Decrease));
    assert_eq!(key_action(KeyCode::PageUp, false), Some(PanelAction::IncreaseCoarse));
    assert_eq!(key_action(KeyCode::PageDown, true), Some(PanelAction::DecreaseCoarse));
    assert_eq!(key_action(KeyCode::KeyR, false), Some(PanelAction::Reset));
    assert_eq!(key_action(KeyCode::KeyW, false), None);
  }

  #[test]
  fn tab_cycles_through_controls() {
    let params = GalaxyParams::default();
    let mut panel = DebugPanel::new(params);
    assert_eq!(panel.focused(), Parameter::Count);
    panel.apply(PanelAction::Previous, &params);
    assert_eq!(panel.focused(), Parameter::OutsideColor);
    for _ in 0..Parameter::ALL.len() {
      panel.apply(PanelAction::Next, &params);
    }
    assert_eq!(panel.focused(), Parameter::OutsideColor);
  }

  #[test]
  fn steps_respect_bounds() {
    let params = GalaxyParams {
      branches: 20,
      ..GalaxyParams::default()
    };
    let mut panel = DebugPanel::new(params);
    while panel.focused() != Parameter::Branches {
      panel.apply(PanelAction::Next, &params);
    }
    let change = panel.apply(PanelAction::IncreaseCoarse, &params).unwrap();
    assert_eq!(change, ParameterChanged::scalar(Parameter::Branches, 20.0));
    let change = panel.apply(PanelAction::Decrease, &params).unwrap();
    assert_eq!(change, ParameterChanged::scalar(Parameter::Branches, 19.0));
  }

  #[test]
  fn color_controls_shift_hue_and_reset() {
    let defaults = GalaxyParams::default();
    let mut panel = DebugPanel::new(defaults);
    panel.apply(PanelAction::Previous, &defaults);

    let change = panel.apply(PanelAction::Increase, &defaults).unwrap();
    assert_eq!(change.parameter, Parameter::OutsideColor);
    assert_ne!(change.value, ParamValue::Color(defaults.outside_color));

    let mut params = defaults;
    params.apply(change);
    let reset = panel.apply(PanelAction::Reset, &params).unwrap();
    assert_eq!(reset.value, ParamValue::Color(defaults.outside_color));
  }

  #[test]
  fn idle_frame_draws_without_edits() {
    let params = GalaxyParams::default();
    let mut panel = DebugPanel::new(params);
    let ctx = egui::Context::default();
    let mut changes = vec![ParameterChanged::scalar(Parameter::Spin, 0.0)];
    for _ in 0..2 {
      let _ = ctx.run(egui::RawInput::default(), |ctx| {
        changes = panel.show(ctx, &params);
      });
    }
    assert!(changes.is_empty());
    assert_eq!(panel.focused(), Parameter::Count);
  }

  #[test]
  fn title_names_focused_control() {
    let params = GalaxyParams::default();
    let panel = DebugPanel::new(params);
    assert_eq!(panel.title(&params), "Galaxy [1/9] count: 100000");
  }
}
