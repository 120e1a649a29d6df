//! Setting value validation.

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "DISPLAY_WIDTH" | "DISPLAY_HEIGHT" => validate_int_range(value, 1, 10_000)?,
        "DISPLAY_ORIENTATION" => {
            if value != "horizontal" && value != "vertical" {
                return Err("must be 'horizontal' or 'vertical'".into());
            }
        }
        "IMAGE_BRIGHTNESS" | "IMAGE_CONTRAST" | "IMAGE_SATURATION" | "IMAGE_SHARPNESS" => {
            let v: f32 = value.parse().map_err(|_| "must be a float")?;
            if !(0.0..=10.0).contains(&v) {
                return Err("must be between 0.0 and 10.0".into());
            }
        }
        "RENDERER_BINARY" => {
            if value.trim().is_empty() {
                return Err("must not be empty".into());
            }
        }
        "RENDER_TIMEOUT_MS" => {
            if !value.is_empty() {
                validate_int_range(value, 100, 600_000)?;
            }
        }
        "VIRTUAL_TIME_BUDGET_MS" => validate_int_range(value, 0, 600_000)?,
        // Boolean settings
        k if is_boolean_setting(k) => {
            if value != "true" && value != "false" {
                return Err("must be 'true' or 'false'".into());
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_int_range(value: &str, min: u64, max: u64) -> Result<(), String> {
    let v: u64 = value.parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}

fn is_boolean_setting(key: &str) -> bool {
    matches!(key, "DISPLAY_INVERTED" | "IMAGE_KEEP_WIDTH" | "IMAGE_PAD_BLUR")
}
