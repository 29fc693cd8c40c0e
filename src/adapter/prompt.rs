//! Prompt construction for headshot generation and retouching

use crate::model::{EditType, GenerationParams, RetouchParams};

pub fn generation_prompt(params: &GenerationParams) -> String {
    format!(
        "A high-end professional headshot of the person shown in the {} reference photos.\n\
         \n\
         SETTINGS:\n\
         - Style: {}\n\
         - Background: {}\n\
         - Camera: 85mm portrait lens, f/1.8 aperture\n\
         - Lighting: Cinematic studio lighting, soft fill, with subtle rim light\n\
         - Pose: Shoulders angled slightly, face forward, confident but approachable\n\
         - Quality: 4K, photorealistic, natural skin texture, no plastic skin.",
        params.reference_images.len(),
        params.style_preset,
        params.background_preset
    )
}

/// Wording for a retouch intensity in `0.1..=1.0`
pub fn intensity_descriptor(intensity: f32) -> &'static str {
    if intensity < 0.3 {
        "subtle"
    } else if intensity < 0.7 {
        "moderate"
    } else {
        "strong"
    }
}

pub fn retouch_prompt(params: &RetouchParams) -> String {
    let mut prompt = format!(
        "Enhance this portrait with {} professional retouching",
        intensity_descriptor(params.intensity)
    );
    if params.preserve_identity {
        prompt.push_str(" while preserving the person's natural identity and appearance.");
    } else {
        prompt.push('.');
    }

    match params.edit_type {
        EditType::Retouch => {
            prompt.push_str(" Improve lighting, skin smoothing, and overall professional appearance.");
        }
        EditType::Background => {
            if let Some(background) = &params.background_prompt {
                prompt.push_str(&format!(" Replace the background with: {}.", background));
            }
        }
        EditType::Both => {
            prompt.push_str(" Improve lighting, skin smoothing, and replace background with ");
            match &params.background_prompt {
                Some(background) => prompt.push_str(&format!("{}.", background)),
                None => prompt.push_str("a professional setting."),
            }
        }
    }

    prompt
}
