//! Builds the HTML body of the newsletter email.

const LOGO_URL: &str =
    "https://raw.githubusercontent.com/KerlynD/colorstack-newsletter/refs/heads/main/assets/colorstack-logo.png";

// Shown when no image has ever been uploaded (or the store is unreachable).
const DEFAULT_IMAGE_URL: &str =
    "https://raw.githubusercontent.com/KerlynD/colorstack-newsletter/refs/heads/main/events/ColorStack__QC_May_Newsletter.png";

/// Renders the self-contained newsletter document for the given image URL,
/// falling back to the committed default asset when no URL is available.
///
/// The output is deterministic: the same input always yields byte-identical
/// HTML. Anything time-dependent (the subject line) is built by the mailer,
/// not here.
pub fn render_newsletter(image_url: Option<&str>) -> String {
    let image_url = image_url.unwrap_or(DEFAULT_IMAGE_URL);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>ColorStack Newsletter</title>
</head>
<body style="font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 0; padding: 0; background-color: #f4f4f4;">
  <center>
    <div style="width: 100%; max-width: 600px; margin: 0 auto; background: #ffffff; padding: 20px; border-radius: 8px; box-shadow: 0 0 10px rgba(0, 0, 0, 0.1);">
      <header style="text-align: center; padding: 10px 0; color: #000000; border-radius: 8px 8px 0 0;">
          <img src="{LOGO_URL}" alt="ColorStack Logo" width="60px">
          <h1>ColorStack Newsletter</h1>
      </header>
      <img src="{image_url}" style="max-width: 100%; height: auto; display: block; margin: 0 auto;">
      <div style="text-align: center; font-size: 12px; color: #666666; margin-top: 20px;">
        <p>You're receiving this email as a member of the ColorStack QC Club.</p>
      </div>
    </div>
  </center>
</body>
</html>"#
    )
}
