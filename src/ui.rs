//! Leptos components: the auth-gated view controller, the two credential
//! forms, and the counter view.

#[cfg(test)]
#[path = "ui_test.rs"]
mod ui_test;

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::{provide_meta_context, MetaTags, Title};
use leptos_router::components::{Route, Router, Routes};
use leptos_router::StaticSegment;

use crate::error::FetchError;
use crate::session::{refresh_visit_count, Session};

/// Which of the three screens is showing. Derived, never stored: the
/// authenticated flag is the sole source of truth for the Home branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    Login,
    SignUp,
    Home,
}

impl ViewMode {
    pub fn current(is_authenticated: bool, show_signup: bool) -> Self {
        if is_authenticated {
            Self::Home
        } else if show_signup {
            Self::SignUp
        } else {
            Self::Login
        }
    }
}

/// What a credential form shows across one submit round trip: the fixed
/// failure message (or none) and whether the inputs stay disabled.
#[derive(Clone, Debug, PartialEq, Eq)]
struct FormFeedback {
    error: String,
    loading: bool,
}

impl FormFeedback {
    /// Submitting clears any stale error and disables the form.
    fn pending() -> Self {
        Self {
            error: String::new(),
            loading: true,
        }
    }

    /// The round trip settled: the form re-enables, and only a failure
    /// leaves a message behind.
    fn settled(result: &Result<(), FetchError>, failure: &str) -> Self {
        Self {
            error: match result {
                Ok(()) => String::new(),
                Err(_) => failure.to_string(),
            },
            loading: false,
        }
    }
}

/// HTML shell rendered on the server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
                <meta name="color-scheme" content="dark light"/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Root component: builds the session service object, hands it to the tree
/// through context, and kicks off validation of any restored token.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let session = Session::new();
    provide_context(session);

    // Persisted sessions are picked up only after hydration, so the first
    // client render matches the server-rendered HTML.
    Effect::new(move |_| {
        if session.resume() {
            spawn_local(async move { session.validate().await });
        }
    });

    view! {
        <Title text="Visit Counter"/>

        <Router>
            <Routes fallback=|| "Page not found.".into_view()>
                <Route path=StaticSegment("") view=CounterPage/>
            </Routes>
        </Router>
    }
}

/// The single page: picks exactly one of {Login, SignUp, Home} from the
/// session flag plus a local toggle, and owns the counter state so an
/// in-flight fetch survives the Home view unmounting.
#[component]
fn CounterPage() -> impl IntoView {
    let session = expect_context::<Session>();
    let (count, set_count) = signal(0u64);
    let show_signup = RwSignal::new(false);

    // One fetch per authentication transition; the commit is guarded against
    // a logout that raced the request.
    Effect::new(move |_| {
        if session.is_authenticated() {
            spawn_local(async move {
                refresh_visit_count(
                    move || async move { session.auth_fetch("/api").await },
                    move || session.logout(),
                    move || session.is_authenticated_untracked(),
                    move |fresh| set_count.set(fresh),
                )
                .await;
            });
        }
    });

    let mode = move || ViewMode::current(session.is_authenticated(), show_signup.get());

    view! {
        {move || match mode() {
            ViewMode::SignUp => view! {
                <div>
                    <SignUp/>
                    <p>
                        "Already have an account? "
                        <button on:click=move |_| show_signup.set(false)>"Log in"</button>
                    </p>
                </div>
            }
            .into_any(),
            ViewMode::Login => view! {
                <div>
                    <Login/>
                    <p>
                        "Don't have an account? "
                        <button on:click=move |_| show_signup.set(true)>"Sign up"</button>
                    </p>
                </div>
            }
            .into_any(),
            ViewMode::Home => view! {
                <Home count=count/>
            }
            .into_any(),
        }}
    }
}

/// Login form. While the request is pending both inputs and the submit
/// button are disabled. Failures show a fixed message; the error detail is
/// discarded.
#[component]
fn Login() -> impl IntoView {
    let session = expect_context::<Session>();
    let (username, set_username) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (error, set_error) = signal(String::new());
    let (is_loading, set_is_loading) = signal(false);

    let apply = move |feedback: FormFeedback| {
        set_error.set(feedback.error);
        set_is_loading.set(feedback.loading);
    };
    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        apply(FormFeedback::pending());
        let user = username.get_untracked();
        let pass = password.get_untracked();
        spawn_local(async move {
            let result = session.login(user, pass).await;
            apply(FormFeedback::settled(&result, "Login failed"));
        });
    };

    view! {
        <form on:submit=on_submit>
            <Show when=move || !error.get().is_empty()>
                <p style="color:red;">{error}</p>
            </Show>
            <div>
                <label>
                    "Username: "
                    <input
                        type="text"
                        prop:value=username
                        on:input=move |ev| set_username.set(event_target_value(&ev))
                        prop:disabled=is_loading
                    />
                </label>
            </div>
            <div>
                <label>
                    "Password: "
                    <input
                        type="password"
                        autocomplete="current-password"
                        prop:value=password
                        on:input=move |ev| set_password.set(event_target_value(&ev))
                        prop:disabled=is_loading
                    />
                </label>
            </div>
            <button type="submit" prop:disabled=is_loading>
                {move || if is_loading.get() { "Logging in..." } else { "Login" }}
            </button>
        </form>
    }
}

/// Signup form. Same shape as Login without the pending state; the raw error
/// goes to the console in addition to the fixed message.
#[component]
fn SignUp() -> impl IntoView {
    let session = expect_context::<Session>();
    let (username, set_username) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (error, set_error) = signal(String::new());

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let user = username.get_untracked();
        let pass = password.get_untracked();
        spawn_local(async move {
            if let Err(err) = session.signup(user, pass).await {
                log::error!("{err:?}");
                set_error.set("Registration failed".to_string());
            }
        });
    };

    view! {
        <form on:submit=on_submit>
            <Show when=move || !error.get().is_empty()>
                <p style="color:red;">{error}</p>
            </Show>
            <div>
                <label>
                    "Username: "
                    <input
                        type="text"
                        prop:value=username
                        on:input=move |ev| set_username.set(event_target_value(&ev))
                    />
                </label>
            </div>
            <div>
                <label>
                    "Password: "
                    <input
                        type="password"
                        autocomplete="new-password"
                        prop:value=password
                        on:input=move |ev| set_password.set(event_target_value(&ev))
                    />
                </label>
            </div>
            <button type="submit">"Sign Up"</button>
        </form>
    }
}

/// Authenticated landing view. A zero count means the fetch has not landed
/// yet and renders as "loading...".
#[component]
fn Home(count: ReadSignal<u64>) -> impl IntoView {
    let session = expect_context::<Session>();

    view! {
        <div>
            <h1>"Hello " {move || session.username().unwrap_or_default()} "!"</h1>
            <p>
                "I have been seen "
                {move || {
                    let n = count.get();
                    if n != 0 { n.to_string() } else { "loading...".to_string() }
                }}
                " times."
            </p>
            <button on:click=move |_| session.logout()>"Logout"</button>
        </div>
    }
}
