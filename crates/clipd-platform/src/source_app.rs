//! Best-effort identification of the application that owns the clipboard.
//!
//! There is no portable API for this, so on Linux the focused window's class
//! is probed through compositor CLIs (sway, Hyprland) and xprop, first one
//! that answers wins. Every failure path collapses to `None`; a capture with
//! an unknown source is stored, it just cannot be blacklisted.

#[cfg(target_os = "linux")]
pub fn detect() -> Option<String> {
    linux::sway_focused_class()
        .or_else(linux::hyprland_active_class)
        .or_else(linux::x11_active_class)
}

#[cfg(not(target_os = "linux"))]
pub fn detect() -> Option<String> {
    None
}

#[cfg(target_os = "linux")]
mod linux {
    use std::process::Command;

    use serde_json::Value;

    fn run(cmd: &str, args: &[&str]) -> Option<String> {
        let output = Command::new(cmd).args(args).output().ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8(output.stdout).ok()
    }

    pub fn sway_focused_class() -> Option<String> {
        let raw = run("swaymsg", &["-t", "get_tree"])?;
        let tree: Value = serde_json::from_str(&raw).ok()?;
        find_focused(&tree)
    }

    fn find_focused(node: &Value) -> Option<String> {
        if node.get("focused").and_then(Value::as_bool) == Some(true) {
            return node
                .pointer("/window_properties/class")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| {
                    node.get("app_id")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                });
        }
        for key in ["nodes", "floating_nodes"] {
            for child in node.get(key).and_then(Value::as_array).into_iter().flatten() {
                if let Some(class) = find_focused(child) {
                    return Some(class);
                }
            }
        }
        None
    }

    pub fn hyprland_active_class() -> Option<String> {
        let raw = run("hyprctl", &["activewindow", "-j"])?;
        let window: Value = serde_json::from_str(&raw).ok()?;
        window
            .get("class")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn x11_active_class() -> Option<String> {
        let raw = run("xprop", &["-root", "_NET_ACTIVE_WINDOW"])?;
        let window_id = raw.split('#').nth(1)?.trim().split_whitespace().next()?.to_string();

        let raw = run("xprop", &["-id", &window_id, "WM_CLASS"])?;
        // WM_CLASS(STRING) = "instance", "Class"
        let value = raw.split('=').nth(1)?;
        let class = value.split(',').next_back()?.trim().trim_matches('"');
        if class.is_empty() {
            None
        } else {
            Some(class.to_string())
        }
    }
}
