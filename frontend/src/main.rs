mod api;
mod components;

use api::{PredictionForm, send_prediction};
use components::header::render_header;
use components::patient_form::render_patient_form;
use components::results::render_results;
use components::utils::render_error_message;
use shared::PredictionResponse;
use wasm_bindgen_futures::spawn_local;
use web_sys::File;
use yew::prelude::*;

pub enum Msg {
    SetName(String),
    SetAge(String),
    SetGender(String),
    SetId(String),
    SetFile(Option<File>),
    Submit,
    PredictionReceived(PredictionResponse),
    SetError(Option<String>),
    Reset,
}

#[derive(Default)]
pub struct Model {
    name: String,
    age: String,
    gender: String,
    id: String,
    file: Option<File>,
    loading: bool,
    result: Option<PredictionResponse>,
    error: Option<String>,
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        Self::default()
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::SetName(value) => self.name = value,
            Msg::SetAge(value) => self.age = value,
            Msg::SetGender(value) => self.gender = value,
            Msg::SetId(value) => self.id = value,
            Msg::SetFile(file) => {
                self.file = file;
                self.result = None;
            }
            Msg::Submit => return self.handle_submit(ctx),
            Msg::PredictionReceived(response) => {
                log::info!("Prediction received: {}", response.prediction);
                self.loading = false;
                self.error = None;
                self.result = Some(response);
            }
            Msg::SetError(error) => {
                self.error = error;
                self.loading = false;
            }
            Msg::Reset => *self = Self::default(),
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                { render_header(self) }

                <main class="main-content">
                    { render_patient_form(self, ctx) }
                    { render_error_message(self) }
                    { render_results(self, ctx) }
                </main>
            </div>
        }
    }
}

impl Model {
    fn handle_submit(&mut self, ctx: &Context<Self>) -> bool {
        let fields = [&self.name, &self.age, &self.gender, &self.id];
        if fields.iter().any(|value| value.trim().is_empty()) {
            self.error = Some("Please fill all fields and upload an image.".into());
            return true;
        }
        let Some(file) = self.file.clone() else {
            self.error = Some("Please fill all fields and upload an image.".into());
            return true;
        };

        self.loading = true;
        self.error = None;
        self.result = None;

        let form = PredictionForm {
            name: self.name.clone(),
            age: self.age.clone(),
            gender: self.gender.clone(),
            id: self.id.clone(),
            file,
        };
        let link = ctx.link().clone();
        spawn_local(async move {
            match send_prediction(form).await {
                Ok(response) => link.send_message(Msg::PredictionReceived(response)),
                Err(e) => {
                    log::error!("Prediction failed: {}", e);
                    link.send_message(Msg::SetError(Some(e)));
                }
            }
        });
        true
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("App starting...");
    yew::Renderer::<Model>::new().render();
}
