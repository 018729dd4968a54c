//! Day/night page styling, picked from the local wall clock.

use chrono::{Local, Timelike};

const DAY_START: u32 = 6;
const NIGHT_START: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Day,
    Night,
}

impl Theme {
    /// `Day` for `06:00 <= hour < 18:00`.
    pub fn for_hour(hour: u32) -> Self {
        if (DAY_START..NIGHT_START).contains(&hour) {
            Theme::Day
        } else {
            Theme::Night
        }
    }

    pub fn current() -> Self {
        Self::for_hour(Local::now().hour())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Day => "day",
            Theme::Night => "night",
        }
    }

    pub fn background(&self) -> &'static str {
        match self {
            Theme::Day => "#f0f0f0",
            Theme::Night => "#1e1e1e",
        }
    }

    /// Body text, headings, notices and footer.
    pub fn text(&self) -> &'static str {
        match self {
            Theme::Day => "#006400",
            Theme::Night => "#40e0d0",
        }
    }

    pub fn stylesheet(&self) -> String {
        let (bg, fg) = (self.background(), self.text());
        format!(
            r#"body {{
    background-color: {bg};
    color: {fg};
    font-family: sans-serif;
    max-width: 46rem;
    margin: 0 auto;
    padding: 1rem;
}}
h1, h2, h3 {{
    color: {fg};
}}
button, .button {{
    display: inline-block;
    background-color: #4a90e2;
    color: #ff0000;
    text-decoration: none;
    border: none;
    border-radius: 5px;
    padding: 10px 20px;
    font-size: 16px;
    cursor: pointer;
}}
button:disabled {{
    opacity: 0.6;
    cursor: wait;
}}
.uploader, .uploader input {{
    color: #ff0000;
}}
.success {{
    color: {fg} !important;
}}
.error {{
    color: #ff0000;
}}
.result img {{
    max-width: 100%;
}}
.caption {{
    text-align: center;
    font-size: 14px;
}}
.spinner {{
    display: inline-block;
    width: 16px;
    height: 16px;
    border: 3px solid #4a90e2;
    border-top-color: transparent;
    border-radius: 50%;
    animation: spin 0.8s linear infinite;
    vertical-align: middle;
}}
@keyframes spin {{
    to {{ transform: rotate(360deg); }}
}}
.footer {{
    color: {fg};
    text-align: center;
    margin-top: 2rem;
}}
.footer a {{
    color: {fg};
    text-decoration: none;
}}
.footer a:hover {{
    text-decoration: underline;
}}
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stylesheet_uses_theme_colours() {
        let night = Theme::Night.stylesheet();
        assert!(night.contains("#1e1e1e"));
        assert!(night.contains("#40e0d0"));
        assert!(!night.contains("#006400"));

        let day = Theme::Day.stylesheet();
        assert!(day.contains("#f0f0f0"));
        assert!(day.contains("border-radius: 5px"));
        assert!(day.contains("padding: 10px 20px"));
    }
}
