//! Renders design briefs into image generation prompts.
//!
//! Both builders are pure: the same request always renders the same text.

use crate::errors::{ApiError, ApiResult};
use crate::models::generation::{MoodboardRequest, Palette, PreviewRequest};

const DEFAULT_HEADING_FONT: &str = "elegant serif";
const DEFAULT_BODY_FONT: &str = "clean sans-serif";
const DEFAULT_RADIUS: &str = "medium";
const DEFAULT_AUDIENCE: &str = "modern users";
const DEFAULT_PAGE: &str = "Landing Page";
const MAX_PAGES: usize = 3;

/// Treats missing and blank strings alike.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn moodboard_prompt(req: &MoodboardRequest) -> ApiResult<String> {
    let vibes = req
        .vibes
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation("At least one vibe is required"))?;
    let vibe_list = vibes.join(", ");

    let subject = match (present(&req.app_name), present(&req.app_desc)) {
        (Some(name), Some(desc)) => format!(" for an app called \"{name}\", {desc}"),
        (Some(name), None) => format!(" for an app called \"{name}\""),
        (None, Some(desc)) => format!(" for an app that is {desc}"),
        (None, None) => String::new(),
    };

    Ok(format!(
        "Create a professional design mood board{subject}.\n\
         \n\
         The aesthetic direction is: {vibe_list}.\n\
         \n\
         Arrange the board as a clean grid split into four quadrants:\n\
         1. Top left: a color palette of 5 to 6 swatches with hex codes, chosen to express the vibes above.\n\
         2. Top right: typography samples showing a heading font and a body font pairing with a short specimen line. Do not use Inter.\n\
         3. Bottom left: rough UI component sketches (buttons, cards, inputs, navigation) rendered in this style.\n\
         4. Bottom right: atmosphere imagery, textures and photography that capture the mood.\n\
         \n\
         Style rules:\n\
         - No generic gradients.\n\
         - Avoid the blue-purple \"AI startup\" look.\n\
         - Make it feel curated and intentional, like a senior designer's reference board.\n\
         - Clean presentation on a neutral background with consistent spacing between quadrants."
    ))
}

pub fn preview_prompt(req: &PreviewRequest) -> ApiResult<String> {
    let app_name = present(&req.app_name)
        .ok_or_else(|| ApiError::validation("App name and colors are required"))?;
    let colors: &Palette = req
        .colors
        .as_ref()
        .ok_or_else(|| ApiError::validation("App name and colors are required"))?;

    let heading_font = present(&req.font_heading).unwrap_or(DEFAULT_HEADING_FONT);
    let body_font = present(&req.font_body).unwrap_or(DEFAULT_BODY_FONT);
    let radius = present(&req.radius).unwrap_or(DEFAULT_RADIUS);
    let audience = present(&req.audience).unwrap_or(DEFAULT_AUDIENCE);

    let pages: Vec<&str> = match req.pages.as_deref() {
        Some(pages) if !pages.is_empty() => {
            pages.iter().take(MAX_PAGES).map(String::as_str).collect()
        }
        _ => vec![DEFAULT_PAGE],
    };

    let description = present(&req.app_desc)
        .map(|desc| format!(" {desc}."))
        .unwrap_or_default();
    let vibe_line = match req.vibes.as_deref() {
        Some(vibes) if !vibes.is_empty() => format!("\nVisual style: {}.", vibes.join(", ")),
        _ => String::new(),
    };

    Ok(format!(
        "Create a high-fidelity UI mockup of the {first_page} for a web app called \"{app_name}\".{description}\n\
         Target audience: {audience}.{vibe_line}\n\
         Pages in scope: {page_list}.\n\
         \n\
         Use EXACTLY these colors, matching the hex values precisely:\n\
         - Background: {bg}\n\
         - Surface / cards: {surface}\n\
         - Primary text: {text_primary}\n\
         - Secondary text: {text_secondary}\n\
         - Accent / buttons: {accent}\n\
         - Borders: {border}\n\
         \n\
         Typography: {heading_font} for headings, {body_font} for body text.\n\
         Corner radius: {radius}.\n\
         \n\
         Layout:\n\
         - A navigation bar with the app name on the left and links on the right.\n\
         - A hero section with a bold headline, a one-line subheading and a primary call-to-action button in the accent color.\n\
         - A row of three feature cards on the surface color, each with an icon, a short title and one line of copy.\n\
         \n\
         Render it as a crisp desktop browser screenshot, pixel-perfect and realistic. No device frames, no annotations.",
        first_page = pages[0],
        page_list = pages.join(", "),
        bg = colors.bg,
        surface = colors.surface,
        text_primary = colors.text_primary,
        text_secondary = colors.text_secondary,
        accent = colors.accent,
        border = colors.border,
    ))
}
