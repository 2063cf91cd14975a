use super::super::{Model, Msg};
use yew::prelude::*;

const DETECTED: &str = "Tumor Detected";

pub fn render_results(model: &Model, ctx: &Context<Model>) -> Html {
    let Some(result) = &model.result else {
        return html! {};
    };

    let detected = result.prediction == DETECTED;
    let patient = &result.patient;

    html! {
        <div class={classes!("results-container", if detected { "tumor-detected" } else { "tumor-clear" })}>
            <h2>{ result.prediction.clone() }</h2>
            <p class="confidence">{ format!("Confidence: {}", result.confidence) }</p>
            {
                if result.simulated {
                    html! {
                        <p class="simulated-warning">
                            {"Simulated result: no trained model is loaded on the server."}
                        </p>
                    }
                } else {
                    html! {}
                }
            }
            <p class="patient-line">
                { format!(
                    "Patient: {} | Age: {} | Gender: {} | ID: {}",
                    patient.name,
                    patient.age,
                    patient.gender_label(),
                    patient.id
                ) }
            </p>
            <button class="new-test-btn" onclick={ctx.link().callback(|_| Msg::Reset)}>
                {"New Test"}
            </button>
        </div>
    }
}
