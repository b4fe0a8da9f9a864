//! Typed user preferences
//!
//! Each preference lives under its own settings key. Enum values persist as
//! their string names; a missing or unrecognized value reads as the default.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bridge_traits::storage::SettingsStore;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use tracing::{debug, warn};

use crate::error::Result;

pub const KEY_GRADIENT: &str = "selectedGradient";
pub const KEY_SCRIPTURE_THEME: &str = "selectedScriptureTheme";
pub const KEY_FONT_SIZE: &str = "selectedFontSize";
pub const KEY_REFRESH_FREQUENCY: &str = "selectedRefreshFrequency";
pub const KEY_BACKGROUND_AUDIO: &str = "enableBackgroundMusic";
pub const KEY_RANDOM_NOTE_COLORS: &str = "useRandomNoteColors";
pub const KEY_STATIC_NOTE_COLOR: &str = "staticNoteColor";

/// Declares a string-backed preference enum with `as_str`, `FromStr`,
/// `Display` and a list of all values.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            default = $default:ident,
            $($variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($name), other)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// App background gradient.
    pub enum BackgroundGradient {
        default = Default,
        Default => "defaultOption",
        Sunrise => "sunrise",
        Ocean => "ocean",
        Forest => "forest",
        Twilight => "twilight",
    }
}

string_enum! {
    /// Color theme of the daily scripture card.
    pub enum ScriptureTheme {
        default = Default,
        Default => "defaultTheme",
        Parchment => "parchment",
        Night => "night",
        HighContrast => "highContrast",
    }
}

string_enum! {
    /// Scripture text size.
    pub enum FontSize {
        default = Medium,
        Small => "small",
        Medium => "medium",
        Large => "large",
        ExtraLarge => "extraLarge",
    }
}

string_enum! {
    /// How often the daily scripture rotates.
    pub enum RefreshFrequency {
        default = OnLaunch,
        OnLaunch => "onLaunch",
        Hourly => "hourly",
        Daily => "daily",
        Weekly => "weekly",
    }
}

string_enum! {
    /// Background color used for notes when random colors are off.
    pub enum NoteColor {
        default = Blue,
        Red => "red",
        Green => "green",
        Blue => "blue",
        Purple => "purple",
        Pink => "pink",
        Gray => "gray",
    }
}

impl FontSize {
    pub fn points(&self) -> f32 {
        match self {
            FontSize::Small => 14.0,
            FontSize::Medium => 17.0,
            FontSize::Large => 20.0,
            FontSize::ExtraLarge => 24.0,
        }
    }
}

impl RefreshFrequency {
    /// Rotation interval; `None` rotates on every launch.
    pub fn interval(&self) -> Option<Duration> {
        match self {
            RefreshFrequency::OnLaunch => None,
            RefreshFrequency::Hourly => Some(Duration::from_secs(60 * 60)),
            RefreshFrequency::Daily => Some(Duration::from_secs(24 * 60 * 60)),
            RefreshFrequency::Weekly => Some(Duration::from_secs(7 * 24 * 60 * 60)),
        }
    }
}

impl NoteColor {
    pub fn hex(&self) -> &'static str {
        match self {
            NoteColor::Red => "#FF3B30",
            NoteColor::Green => "#34C759",
            NoteColor::Blue => "#007AFF",
            NoteColor::Purple => "#800080",
            NoteColor::Pink => "#FF33FF",
            NoteColor::Gray => "#8E8E93",
        }
    }
}

/// Every preference at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub gradient: BackgroundGradient,
    pub scripture_theme: ScriptureTheme,
    pub font_size: FontSize,
    pub refresh_frequency: RefreshFrequency,
    pub background_audio: bool,
    pub random_note_colors: bool,
    pub static_note_color: NoteColor,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            gradient: BackgroundGradient::default(),
            scripture_theme: ScriptureTheme::default(),
            font_size: FontSize::default(),
            refresh_frequency: RefreshFrequency::default(),
            background_audio: false,
            random_note_colors: true,
            static_note_color: NoteColor::default(),
        }
    }
}

/// Reads and writes preferences through the settings store.
#[derive(Clone)]
pub struct PreferencesStore {
    store: Arc<dyn SettingsStore>,
    events: Option<EventBus>,
}

impl PreferencesStore {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    async fn read_enum<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr<Err = String> + Default,
    {
        match self.store.get_string(key).await? {
            Some(raw) => Ok(raw.parse().unwrap_or_else(|e| {
                warn!(key, error = %e, "Ignoring unrecognized preference value");
                T::default()
            })),
            None => Ok(T::default()),
        }
    }

    async fn write_str(&self, key: &str, value: &str) -> Result<()> {
        self.store.set_string(key, value).await?;
        debug!(key, value, "Preference updated");
        self.changed(key);
        Ok(())
    }

    async fn write_bool(&self, key: &str, value: bool) -> Result<()> {
        self.store.set_bool(key, value).await?;
        debug!(key, value, "Preference updated");
        self.changed(key);
        Ok(())
    }

    fn changed(&self, key: &str) {
        if let Some(events) = &self.events {
            let _ = events.emit(CoreEvent::Library(LibraryEvent::PreferenceChanged {
                key: key.to_string(),
            }));
        }
    }

    pub async fn gradient(&self) -> Result<BackgroundGradient> {
        self.read_enum(KEY_GRADIENT).await
    }

    pub async fn set_gradient(&self, value: BackgroundGradient) -> Result<()> {
        self.write_str(KEY_GRADIENT, value.as_str()).await
    }

    pub async fn scripture_theme(&self) -> Result<ScriptureTheme> {
        self.read_enum(KEY_SCRIPTURE_THEME).await
    }

    pub async fn set_scripture_theme(&self, value: ScriptureTheme) -> Result<()> {
        self.write_str(KEY_SCRIPTURE_THEME, value.as_str()).await
    }

    pub async fn font_size(&self) -> Result<FontSize> {
        self.read_enum(KEY_FONT_SIZE).await
    }

    pub async fn set_font_size(&self, value: FontSize) -> Result<()> {
        self.write_str(KEY_FONT_SIZE, value.as_str()).await
    }

    pub async fn refresh_frequency(&self) -> Result<RefreshFrequency> {
        self.read_enum(KEY_REFRESH_FREQUENCY).await
    }

    pub async fn set_refresh_frequency(&self, value: RefreshFrequency) -> Result<()> {
        self.write_str(KEY_REFRESH_FREQUENCY, value.as_str()).await
    }

    pub async fn background_audio(&self) -> Result<bool> {
        Ok(self.store.get_bool(KEY_BACKGROUND_AUDIO).await?.unwrap_or(false))
    }

    pub async fn set_background_audio(&self, enabled: bool) -> Result<()> {
        self.write_bool(KEY_BACKGROUND_AUDIO, enabled).await
    }

    pub async fn random_note_colors(&self) -> Result<bool> {
        Ok(self.store.get_bool(KEY_RANDOM_NOTE_COLORS).await?.unwrap_or(true))
    }

    pub async fn set_random_note_colors(&self, enabled: bool) -> Result<()> {
        self.write_bool(KEY_RANDOM_NOTE_COLORS, enabled).await
    }

    pub async fn static_note_color(&self) -> Result<NoteColor> {
        self.read_enum(KEY_STATIC_NOTE_COLOR).await
    }

    pub async fn set_static_note_color(&self, value: NoteColor) -> Result<()> {
        self.write_str(KEY_STATIC_NOTE_COLOR, value.as_str()).await
    }

    pub async fn load_all(&self) -> Result<Preferences> {
        Ok(Preferences {
            gradient: self.gradient().await?,
            scripture_theme: self.scripture_theme().await?,
            font_size: self.font_size().await?,
            refresh_frequency: self.refresh_frequency().await?,
            background_audio: self.background_audio().await?,
            random_note_colors: self.random_note_colors().await?,
            static_note_color: self.static_note_color().await?,
        })
    }
}

impl fmt::Debug for PreferencesStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferencesStore").finish_non_exhaustive()
    }
}
