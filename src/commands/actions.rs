//! Built-in desktop actions
//!
//! Each action maps to a platform-specific process invocation, overridable
//! from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

use super::executor::{ActionExecutor, Invocation};
use super::registry::CommandAction;

/// The fixed set of desktop actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DesktopAction {
    OpenBrowser,
    TakeScreenshot,
    MinimizeAll,
    MaximizeWindow,
    MinimizeWindow,
    NextWindow,
    VolumeUp,
    VolumeDown,
    Mute,
}

impl DesktopAction {
    /// All actions in registration order.
    pub const ALL: [DesktopAction; 9] = [
        Self::OpenBrowser,
        Self::TakeScreenshot,
        Self::MinimizeAll,
        Self::MaximizeWindow,
        Self::MinimizeWindow,
        Self::NextWindow,
        Self::VolumeUp,
        Self::VolumeDown,
        Self::Mute,
    ];

    /// Spoken/typed command name.
    pub fn name(self) -> &'static str {
        match self {
            Self::OpenBrowser => "open browser",
            Self::TakeScreenshot => "take screenshot",
            Self::MinimizeAll => "minimize all",
            Self::MaximizeWindow => "maximize window",
            Self::MinimizeWindow => "minimize window",
            Self::NextWindow => "next window",
            Self::VolumeUp => "volume up",
            Self::VolumeDown => "volume down",
            Self::Mute => "mute",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Invocation for the platform this binary was built for.
    pub fn default_invocation(self) -> Invocation {
        if cfg!(target_os = "windows") {
            self.windows_invocation()
        } else if cfg!(target_os = "macos") {
            self.macos_invocation()
        } else {
            self.linux_invocation()
        }
    }

    fn linux_invocation(self) -> Invocation {
        let key = |chord: &str| Invocation::new("xdotool", ["key", chord]);
        match self {
            Self::OpenBrowser => Invocation::new("google-chrome", Vec::<String>::new()).detached(),
            Self::TakeScreenshot => Invocation::new("import", ["-window", "root", "{file}"]),
            Self::MinimizeAll => key("super+d"),
            Self::MaximizeWindow => key("super+Up"),
            Self::MinimizeWindow => key("super+Down"),
            Self::NextWindow => key("alt+Tab"),
            Self::VolumeUp => key("XF86AudioRaiseVolume"),
            Self::VolumeDown => key("XF86AudioLowerVolume"),
            Self::Mute => key("XF86AudioMute"),
        }
    }

    fn macos_invocation(self) -> Invocation {
        let script = |s: &str| Invocation::new("osascript", ["-e", s]);
        match self {
            Self::OpenBrowser => Invocation::new("open", ["-a", "Google Chrome"]).detached(),
            Self::TakeScreenshot => Invocation::new("screencapture", ["-x", "{file}"]),
            Self::MinimizeAll | Self::MinimizeWindow => {
                script(r#"tell application "System Events" to keystroke "m" using command down"#)
            }
            Self::MaximizeWindow => {
                script(r#"tell application "System Events" to keystroke "f" using {control down, command down}"#)
            }
            Self::NextWindow => script(r#"tell application "System Events" to key code 48 using command down"#),
            Self::VolumeUp => script("set volume output volume ((output volume of (get volume settings)) + 6)"),
            Self::VolumeDown => script("set volume output volume ((output volume of (get volume settings)) - 6)"),
            Self::Mute => script("set volume output muted (not (output muted of (get volume settings)))"),
        }
    }

    fn windows_invocation(self) -> Invocation {
        let ps = |s: &str| Invocation::new("powershell", ["-NoProfile", "-Command", s]);
        let send_keys = |keys: &str| ps(&format!("(New-Object -ComObject WScript.Shell).SendKeys('{}')", keys));
        let send_char = |code: u8| ps(&format!("(New-Object -ComObject WScript.Shell).SendKeys([char]{})", code));
        match self {
            Self::OpenBrowser => Invocation::new("cmd", ["/C", "start", "chrome"]).detached(),
            Self::TakeScreenshot => ps(concat!(
                "Add-Type -AssemblyName System.Windows.Forms,System.Drawing; ",
                "$b=[System.Windows.Forms.Screen]::PrimaryScreen.Bounds; ",
                "$i=New-Object System.Drawing.Bitmap $b.Width,$b.Height; ",
                "[System.Drawing.Graphics]::FromImage($i).CopyFromScreen($b.Location,[System.Drawing.Point]::Empty,$b.Size); ",
                "$i.Save('{file}')"
            )),
            Self::MinimizeAll => ps("(New-Object -ComObject Shell.Application).MinimizeAll()"),
            Self::MaximizeWindow => send_keys("% x"),
            Self::MinimizeWindow => send_keys("% n"),
            Self::NextWindow => send_keys("%{TAB}"),
            Self::VolumeUp => send_char(175),
            Self::VolumeDown => send_char(174),
            Self::Mute => send_char(173),
        }
    }
}

/// A desktop action bound to an executor and its resolved invocation.
pub struct DesktopCommand {
    action: DesktopAction,
    invocation: Invocation,
    executor: Arc<dyn ActionExecutor>,
}

impl DesktopCommand {
    pub fn new(action: DesktopAction, invocation: Invocation, executor: Arc<dyn ActionExecutor>) -> Self {
        Self {
            action,
            invocation,
            executor,
        }
    }

    /// Build every built-in action, applying argv overrides keyed by command name.
    pub fn builtins(executor: Arc<dyn ActionExecutor>, overrides: &HashMap<String, Vec<String>>) -> Vec<Self> {
        DesktopAction::ALL
            .into_iter()
            .map(|action| {
                let invocation = overrides
                    .get(action.name())
                    .and_then(|argv| Invocation::from_argv(argv))
                    .unwrap_or_else(|| action.default_invocation());
                Self::new(action, invocation, executor.clone())
            })
            .collect()
    }

    pub fn action(&self) -> DesktopAction {
        self.action
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }
}

#[async_trait]
impl CommandAction for DesktopCommand {
    async fn run(&self) -> Result<()> {
        log::info!("Running '{}': {}", self.action.name(), self.invocation);
        self.executor.run(&self.invocation).await
    }
}
