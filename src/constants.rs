//! Shared constants.

/// Fixed body for the uniform 500 error response.
pub const ERROR_MESSAGE: &str = "An error occurred while processing the image.";

/// Help page served when a request carries neither `url` nor `text`.
pub const HELP_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Image Transformation Service</title>
  <style>
    body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }
    code { background: #f0f0f0; padding: 0.1rem 0.3rem; border-radius: 3px; }
    td { padding: 0.2rem 0.6rem; vertical-align: top; }
  </style>
</head>
<body>
  <h1>Image Transformation Service</h1>
  <p>Fetches an image from a URL, applies transformations, and returns the result.
     Provide <code>url</code> and/or <code>text</code> to get started, for example
     <code>/?url=https://example.com/image.jpg&amp;w=300&amp;output=webp</code>.</p>
  <h2>Query Parameters</h2>
  <table>
    <tr><td><code>url</code></td><td>Source image URL to fetch and transform.</td></tr>
    <tr><td><code>default</code></td><td>Fallback image URL (percent-encoded), used when the source fetch fails.</td></tr>
    <tr><td><code>w</code>, <code>h</code></td><td>Target width and height in pixels.</td></tr>
    <tr><td><code>dpr</code></td><td>Device pixel ratio multiplier for <code>w</code> and <code>h</code>. Default 1.</td></tr>
    <tr><td><code>fit</code></td><td>Resize fit mode: <code>inside</code> (default), <code>outside</code>, <code>cover</code>, <code>fill</code>, <code>contain</code>.</td></tr>
    <tr><td><code>cbg</code></td><td>Letterbox background color for <code>fit=contain</code>.</td></tr>
    <tr><td><code>we</code></td><td>Without enlargement: <code>true</code> never scales above the source size.</td></tr>
    <tr><td><code>output</code></td><td>Output format: <code>jpeg</code> (default), <code>png</code>, <code>webp</code>, <code>tiff</code>, <code>gif</code>, or <code>json</code> for metadata.</td></tr>
    <tr><td><code>q</code></td><td>Encode quality 1-100. Default 80.</td></tr>
    <tr><td><code>l</code></td><td>PNG compression level 0-9. Default 6.</td></tr>
    <tr><td><code>il</code></td><td>Interlaced/progressive output: <code>true</code> to request it.</td></tr>
    <tr><td><code>n</code></td><td>Number of pages: <code>-1</code> decodes all pages of a multi-page image.</td></tr>
    <tr><td><code>page</code></td><td>Page index to decode from a multi-page image.</td></tr>
    <tr><td><code>encoding</code></td><td><code>base64</code> returns a JSON body with a data URI instead of raw bytes.</td></tr>
    <tr><td><code>bg</code></td><td>Background color to flatten transparency onto.</td></tr>
    <tr><td><code>blur</code></td><td>Gaussian blur sigma, applied within 0.3-1000.</td></tr>
    <tr><td><code>gam</code></td><td>Gamma correction 1.0-3.0. Out-of-range values use 2.2.</td></tr>
    <tr><td><code>mod</code></td><td>Modulate as <code>brightness,saturation,hue</code>.</td></tr>
    <tr><td><code>sharp</code></td><td>Sharpen sigma.</td></tr>
    <tr><td><code>maxage</code></td><td>Cache-Control max-age seconds. Default 31536000.</td></tr>
    <tr><td><code>filename</code></td><td>Download filename for the Content-Disposition header.</td></tr>
    <tr><td><code>text</code></td><td>Text to render, standalone or over the fetched image.</td></tr>
    <tr><td><code>txtColor</code></td><td>Text color. Default #000000.</td></tr>
    <tr><td><code>fontSize</code></td><td>Font size in pixels. Default 48.</td></tr>
    <tr><td><code>fontFamily</code></td><td>Font family name. Default Arial.</td></tr>
    <tr><td><code>textAlign</code></td><td>Horizontal alignment: <code>left</code>, <code>center</code> (default), <code>right</code>.</td></tr>
    <tr><td><code>textBaseline</code></td><td>Vertical baseline: <code>top</code>, <code>hanging</code>, <code>middle</code> (default), <code>alphabetic</code>, <code>ideographic</code>, <code>bottom</code>.</td></tr>
    <tr><td><code>roundedCorners</code></td><td><code>true</code> rounds the text canvas corners.</td></tr>
    <tr><td><code>cornerRadius</code></td><td>Corner radius in pixels when rounding. Default 20.</td></tr>
  </table>
</body>
</html>
"#;
