//! Driver scripts run with `python -c`.
//!
//! Each script takes two arguments: a JSON request and the path of a file to
//! write its JSON response to. Framework output goes to the inherited
//! stdout/stderr untouched.

pub const PROBE: &str = r#"
import json
import ultralytics
print(json.dumps({"version": ultralytics.__version__}))
"#;

pub const TRAIN: &str = r#"
import json
import sys
from pathlib import Path

request = json.loads(sys.argv[1])
response_path = Path(sys.argv[2])

from ultralytics import YOLO

model = YOLO(request["model"])
results = model.train(
    data=request["data"],
    epochs=request["epochs"],
    imgsz=request["imgsz"],
    batch=request["batch"],
    workers=request["workers"],
    project=request["project"],
    name=request["name"],
    exist_ok=request["exist_ok"],
    device=request["device"],
)

save_dir = getattr(results, "save_dir", None)
if save_dir is None:
    save_dir = getattr(getattr(model, "trainer", None), "save_dir", None)

response_path.write_text(json.dumps({"save_dir": str(Path(save_dir).resolve()) if save_dir else None}))
"#;

pub const EXPORT: &str = r#"
import json
import sys
from pathlib import Path

request = json.loads(sys.argv[1])
response_path = Path(sys.argv[2])

from ultralytics import YOLO

model = YOLO(request["model"])
exported = model.export(
    format=request["format"],
    imgsz=request["imgsz"],
    dynamic=request["dynamic"],
    simplify=request["simplify"],
    opset=request["opset"],
)

response_path.write_text(json.dumps({"path": str(Path(exported).resolve()) if exported else None}))
"#;
