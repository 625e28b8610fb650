//! Override resolution for [`LlmOptions`]

use super::LlmOptions;

/// Merge a per-call override on top of a base configuration.
///
/// Each field of the result comes from `overrides` when the override
/// explicitly specifies it and from `base` otherwise. Neither input is
/// modified. `provider_options` is replaced as a whole, never merged key by
/// key: a present override map (even an empty one) hides the base map.
pub fn merge_options(base: &LlmOptions, overrides: &LlmOptions) -> LlmOptions {
    LlmOptions {
        provider: overrides.provider.clone().or_else(|| base.provider.clone()),
        api_key: if overrides.api_key.is_empty() {
            base.api_key.clone()
        } else {
            overrides.api_key.clone()
        },
        model: pick_string(&base.model, &overrides.model),
        project_id: pick_string(&base.project_id, &overrides.project_id),
        region: pick_string(&base.region, &overrides.region),
        output_format: overrides.output_format.or(base.output_format),
        max_tokens: overrides.max_tokens.or(base.max_tokens),
        temperature: overrides.temperature.or(base.temperature),
        verbose: overrides.verbose.or(base.verbose),
        span: overrides.span.clone().or_else(|| base.span.clone()),
        provider_options: overrides
            .provider_options
            .clone()
            .or_else(|| base.provider_options.clone()),
        mock_response: pick_string(&base.mock_response, &overrides.mock_response),
    }
}

fn pick_string(base: &str, overrides: &str) -> String {
    if overrides.is_empty() {
        base.to_string()
    } else {
        overrides.to_string()
    }
}
