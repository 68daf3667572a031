//! Command-line interface (§6), grounded on the teacher's `clap` derive
//! style in `cli.rs` — a single `#[derive(Parser)]` struct with doc
//! comments doubling as `--help` text — generalized with `env(...)`
//! attributes so every flag additionally reads its default from the
//! matching `XWL_*` environment variable, as spec.md §6 requires.

use std::path::PathBuf;

use clap::Parser;

/// Run a program under a rootless Xwayland bridged onto a Wayland
/// compositor.
#[derive(Debug, Parser)]
#[command(name = "xwl-run", version)]
pub struct Cli {
    /// Scale factor applied between the host compositor and the guest X
    /// server, in the range 0.1 to 10.0.
    #[arg(long, env = "XWL_SCALE", default_value_t = 1.0, value_parser = parse_scale)]
    pub scale: f64,

    /// Override the `WM_CLASS`/app-id advertised for every window.
    #[arg(long)]
    pub app_id: Option<String>,

    /// Force a specific X display number instead of letting Xwayland pick
    /// one.
    #[arg(long)]
    pub display: Option<u32>,

    /// Keep running after the supervised program exits.
    #[arg(long)]
    pub no_exit_with_child: bool,

    /// Don't take over the Wayland clipboard manager role.
    #[arg(long, env = "XWL_CLIPBOARD_MANAGER", default_value_t = true, action = clap::ArgAction::SetFalse)]
    pub clipboard_manager: bool,

    /// Decoration frame color, as `#RRGGBB`.
    #[arg(long, env = "XWL_FRAME_COLOR", value_parser = parse_color)]
    pub frame_color: Option<(u8, u8, u8)>,

    /// Show each window's title in its decoration frame.
    #[arg(long, env = "XWL_SHOW_WINDOW_TITLE", default_value_t = false)]
    pub show_window_title: bool,

    /// DRM render node to advertise through the legacy `wl_drm` shim.
    #[arg(long, env = "XWL_DRM_DEVICE")]
    pub drm_device: Option<PathBuf>,

    /// Enable Xwayland's GLAMOR (GPU-accelerated) rendering backend.
    #[arg(long, env = "XWL_GLAMOR", default_value_t = false)]
    pub glamor: bool,

    /// Program to run, and its arguments.
    #[arg(trailing_var_arg = true, required = true)]
    pub program: Vec<String>,
}

fn parse_scale(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("not a number: {s}"))?;
    if !(0.1..=10.0).contains(&v) {
        return Err(format!("scale must be between 0.1 and 10.0, got {v}"));
    }
    Ok(v)
}

fn parse_color(s: &str) -> Result<(u8, u8, u8), String> {
    let s = s.strip_prefix('#').unwrap_or(s);
    if s.len() != 6 {
        return Err(format!("expected #RRGGBB, got {s}"));
    }
    let r = u8::from_str_radix(&s[0..2], 16).map_err(|e| e.to_string())?;
    let g = u8::from_str_radix(&s[2..4], 16).map_err(|e| e.to_string())?;
    let b = u8::from_str_radix(&s[4..6], 16).map_err(|e| e.to_string())?;
    Ok((r, g, b))
}

impl Cli {
    pub fn into_options(self) -> crate::bridge::Options {
        crate::bridge::Options {
            scale: self.scale,
            app_id: self.app_id,
            display: self.display,
            exit_with_child: !self.no_exit_with_child,
            clipboard_manager: self.clipboard_manager,
            frame_color: self.frame_color,
            show_window_title: self.show_window_title,
            drm_device: self.drm_device,
            glamor: self.glamor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_out_of_range_is_rejected() {
        assert!(parse_scale("0.01").is_err());
        assert!(parse_scale("11").is_err());
        assert!(parse_scale("1.5").is_ok());
    }

    #[test]
    fn color_parses_with_or_without_hash() {
        assert_eq!(parse_color("#ff0080").unwrap(), (0xff, 0x00, 0x80));
        assert_eq!(parse_color("ff0080").unwrap(), (0xff, 0x00, 0x80));
        assert!(parse_color("nope").is_err());
    }

    #[test]
    fn trailing_var_arg_captures_program_and_its_flags() {
        let cli = Cli::parse_from(["xwl-run", "--scale=2.0", "xterm", "-e", "bash"]);
        assert_eq!(cli.scale, 2.0);
        assert_eq!(cli.program, vec!["xterm", "-e", "bash"]);
    }

    #[test]
    fn exit_with_child_defaults_true() {
        let cli = Cli::parse_from(["xwl-run", "xterm"]);
        assert!(cli.into_options().exit_with_child);
    }
}
