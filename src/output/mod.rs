use console::Style;

pub mod events;
pub mod log;
pub mod progress;

pub use events::{conversion_percent, parse_download_line, parse_transcode_line, LineEvent};
pub use log::RunLog;
pub use progress::{ConversionView, DownloadView};

/// Role of a status message, mapped to a color by the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Header,
    Info,
    Accent,
    Success,
    Warning,
    Failure,
    Emphasis,
}

#[derive(Debug, Clone)]
pub struct Palette {
    pub header: Style,
    pub info: Style,
    pub accent: Style,
    pub success: Style,
    pub warning: Style,
    pub failure: Style,
    pub emphasis: Style,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            header: Style::new().magenta().bright().force_styling(true),
            info: Style::new().blue().bright().force_styling(true),
            accent: Style::new().cyan().bright().force_styling(true),
            success: Style::new().green().bright().force_styling(true),
            warning: Style::new().yellow().bright().force_styling(true),
            failure: Style::new().red().bright().force_styling(true),
            emphasis: Style::new().bold().force_styling(true),
        }
    }
}

/// Terminal presentation settings, resolved once at startup
#[derive(Debug, Clone)]
pub struct Console {
    enabled: bool,
    debug: bool,
    palette: Palette,
}

impl Console {
    pub fn new(enabled: bool, debug: bool) -> Self {
        Self {
            enabled,
            debug,
            palette: Palette::default(),
        }
    }

    /// Colors only when asked for and stdout is a terminal
    pub fn detect(color_flag: bool, debug: bool) -> Self {
        Self::new(color_flag && console::Term::stdout().is_term(), debug)
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn paint(&self, tone: Tone, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }

        let style = match tone {
            Tone::Plain => return text.to_string(),
            Tone::Header => &self.palette.header,
            Tone::Info => &self.palette.info,
            Tone::Accent => &self.palette.accent,
            Tone::Success => &self.palette.success,
            Tone::Warning => &self.palette.warning,
            Tone::Failure => &self.palette.failure,
            Tone::Emphasis => &self.palette.emphasis,
        };
        style.apply_to(text).to_string()
    }

    /// Print a line to stdout in the given tone
    pub fn say(&self, tone: Tone, text: &str) {
        println!("{}", self.paint(tone, text));
    }

    /// Print an empty line followed by the message
    pub fn say_spaced(&self, tone: Tone, text: &str) {
        println!();
        self.say(tone, text);
    }
}
