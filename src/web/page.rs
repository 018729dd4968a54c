use crate::theme::Theme;

/// File name offered for the annotated download.
pub const DOWNLOAD_NAME: &str = "detected_pedestrians.jpg";

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en" data-theme="__THEME__">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Pedestrian Detection App</title>
<link rel="icon" href="data:image/svg+xml,<svg xmlns=%22http://www.w3.org/2000/svg%22 viewBox=%220 0 100 100%22><text y=%22.9em%22 font-size=%2290%22>🚶</text></svg>">
<style>
__STYLE__
</style>
</head>
<body>
<h1>🚶‍♂️ Pedestrian Detection App</h1>
<p><strong>Detect pedestrians in your images using YOLOv8!</strong></p>
<p>
Welcome to the Pedestrian Detection App! This app uses the YOLOv8 model to detect pedestrians in images.
Simply upload an image, click the <strong>Detect Pedestrians</strong> button, and the app will highlight any detected pedestrians.
You can also download the processed image with the detection results.
</p>

<div class="uploader">
  <label for="image">Upload an image</label><br>
  <input id="image" name="image" type="file" accept=".jpg,.jpeg,.png,image/jpeg,image/png">
</div>

<p id="uploaded" class="success" hidden>Image uploaded successfully!</p>
<p id="error" class="error" hidden></p>

<p id="actions" hidden>
  <button id="detect" type="button">Detect Pedestrians</button>
  <span id="busy" hidden><span class="spinner"></span> Detecting pedestrians...</span>
</p>

<div id="result" class="result" hidden>
  <img id="annotated" alt="Detected Pedestrians">
  <p class="caption">Detected Pedestrians</p>
  <a id="download" class="button" download="__DOWNLOAD__">Download Processed Image</a>
</div>

<div class="footer">
  <p>Made with ❤️ using YOLOv8, ONNX Runtime and Rust</p>
</div>

<script>
(function () {
  const input = document.getElementById("image");
  const uploaded = document.getElementById("uploaded");
  const error = document.getElementById("error");
  const actions = document.getElementById("actions");
  const detect = document.getElementById("detect");
  const busy = document.getElementById("busy");
  const result = document.getElementById("result");
  const annotated = document.getElementById("annotated");
  const download = document.getElementById("download");
  let objectUrl = null;

  function reset() {
    error.hidden = true;
    result.hidden = true;
    download.removeAttribute("href");
    if (objectUrl) {
      URL.revokeObjectURL(objectUrl);
      objectUrl = null;
    }
  }

  input.addEventListener("change", function () {
    reset();
    const ok = input.files.length > 0;
    uploaded.hidden = !ok;
    actions.hidden = !ok;
  });

  detect.addEventListener("click", async function () {
    if (input.files.length === 0) {
      return;
    }
    reset();
    detect.disabled = true;
    busy.hidden = false;
    const form = new FormData();
    form.append("image", input.files[0]);
    try {
      const response = await fetch("/api/detect", { method: "POST", body: form });
      if (!response.ok) {
        const body = await response.json().catch(function () { return { error: response.statusText }; });
        throw new Error(body.error || response.statusText);
      }
      const blob = await response.blob();
      objectUrl = URL.createObjectURL(blob);
      annotated.src = objectUrl;
      download.href = objectUrl;
      result.hidden = false;
    } catch (e) {
      error.textContent = e.message;
      error.hidden = false;
    } finally {
      busy.hidden = true;
      detect.disabled = false;
    }
  });
})();
</script>
</body>
</html>
"#;

pub fn render_index(theme: Theme) -> String {
    PAGE.replace("__THEME__", theme.name())
        .replace("__STYLE__", &theme.stylesheet())
        .replace("__DOWNLOAD__", DOWNLOAD_NAME)
}
