//! Leptos application: every URL is resolved by the console [`Router`], so
//! guards and redirects behave the same as in the native host.
//!
//! [`Router`]: crate::routes::Router

use std::rc::Rc;

use leptos::*;
use leptos_router::{
    use_location, use_navigate, use_query_map, NavigateOptions, Route, Router as LeptosRouter,
    Routes, A,
};

use staffdesk_auth::{
    Credentials, NavigationRequest, RoleCatalog, Session, SessionError,
};

use crate::access::{Requirement, ViewSlot};
use crate::config::ConsoleConfig;
use crate::console::Console;
use crate::errors::user_message;
use crate::frontend::browser::{to_href, BrowserStorage, SignalNavigator};
use crate::http::HttpAuthBackend;
use crate::routes::{Page, Resolution};

/// Shared state provided to every component.
#[derive(Clone)]
struct AppContext {
    console: Rc<Console>,
    session: RwSignal<Rc<Session>>,
}

fn app_context() -> Option<AppContext> {
    use_context::<AppContext>()
}

/// Main application component.
#[component]
pub fn App() -> impl IntoView {
    let pending = create_rw_signal(None::<NavigationRequest>);
    let config = ConsoleConfig::default();

    let console = match Console::start(
        config.clone(),
        Rc::new(BrowserStorage),
        Rc::new(SignalNavigator(pending)),
        Rc::new(HttpAuthBackend::new(config)),
    ) {
        Ok(console) => Rc::new(console),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "console failed to start");
            return view! { <p class="fatal">{format!("{e:#}")}</p> }.into_view();
        }
    };

    let session = create_rw_signal(console.session().session());
    let subscription = console
        .session()
        .subscribe(move |s| session.set(Rc::new(s.clone())));
    on_cleanup(move || drop(subscription));

    // A discarded stored session queued its login redirect; perform it once mounted.
    let store = console.session().clone();
    wasm_bindgen_futures::spawn_local(async move {
        store.run_deferred();
    });

    provide_context(AppContext { console, session });

    view! {
        <LeptosRouter>
            <NavigationBridge pending/>
            <Routes>
                <Route path="/*any" view=Shell/>
            </Routes>
        </LeptosRouter>
    }
    .into_view()
}

/// Performs navigation requests issued outside the router's reactive scope.
#[component]
fn NavigationBridge(pending: RwSignal<Option<NavigationRequest>>) -> impl IntoView {
    let navigate = use_navigate();
    create_effect(move |_| {
        if let Some(request) = pending.get() {
            navigate(&to_href(&request), NavigateOptions::default());
        }
    });
}

/// Resolves the current location and renders the matching page.
#[component]
fn Shell() -> impl IntoView {
    let Some(ctx) = app_context() else {
        return ().into_view();
    };
    let location = use_location();

    (move || {
        // Re-resolve on session transitions, not only on navigation.
        ctx.session.track();
        let url = format!("{}{}", location.pathname.get(), location.search.get());

        match ctx.console.router().resolve(&url) {
            Resolution::Render(Page::Login) => view! { <LoginPage/> }.into_view(),
            Resolution::Render(Page::Unauthorized) => view! { <UnauthorizedPage/> }.into_view(),
            Resolution::Render(page) => view! { <Layout page/> }.into_view(),
            Resolution::Redirect(request) => {
                ctx.console.session().navigator().navigate(request);
                ().into_view()
            }
            Resolution::Blocked => ().into_view(),
        }
    })
    .into_view()
}

/// Toggles a signal; [`Can`] renders its children while the signal is set.
struct SignalSlot(RwSignal<bool>);

impl ViewSlot for SignalSlot {
    fn attach(&mut self) {
        self.0.set(true);
    }

    fn detach(&mut self) {
        self.0.set(false);
    }
}

/// Renders `children` only while the session satisfies `permission`.
#[component]
pub fn Can(#[prop(into)] permission: MaybeSignal<Requirement>, children: ChildrenFn) -> impl IntoView {
    let Some(ctx) = app_context() else {
        return ().into_view();
    };

    let visible = create_rw_signal(false);
    let gate = store_value(ctx.console.gate(permission.get_untracked(), SignalSlot(visible)));
    create_effect(move |_| {
        let requirement = permission.get();
        gate.with_value(|gate| gate.set_requirement(requirement));
    });

    view! {
        <Show when=move || visible.get()>
            {children()}
        </Show>
    }
    .into_view()
}

#[component]
fn Layout(page: Page) -> impl IntoView {
    let Some(ctx) = app_context() else {
        return ().into_view();
    };

    let collapsed = create_rw_signal(ctx.console.preferences().sidebar_collapsed());
    let toggle = {
        let console = ctx.console.clone();
        move |_| {
            let next = !collapsed.get_untracked();
            console.preferences().set_sidebar_collapsed(next);
            collapsed.set(console.preferences().sidebar_collapsed());
        }
    };
    let logout = {
        let console = ctx.console.clone();
        move |_| console.session().logout()
    };

    let user_name = move || {
        ctx.session
            .get()
            .user()
            .map(|u| u.full_name())
            .unwrap_or_default()
    };
    let nav = ctx.console.router().table().nav_items();

    view! {
        <div class="layout" class:collapsed=move || collapsed.get()>
            <header>
                <button class="sidebar-toggle" on:click=toggle>"☰"</button>
                <h1>"StaffDesk"</h1>
                <span class="user">{user_name}</span>
                <button class="logout" on:click=logout>"Log out"</button>
            </header>
            <nav class="sidebar">
                {nav
                    .into_iter()
                    .map(|item| {
                        let link = view! { <A href=item.path.clone()>{item.label}</A> };
                        match item.permission {
                            Some(permission) => view! {
                                <Can permission=Requirement::from(permission)>
                                    {link.clone()}
                                </Can>
                            }
                            .into_view(),
                            None => link.into_view(),
                        }
                    })
                    .collect_view()}
            </nav>
            <main>
                <h2>{page.title()}</h2>
                {match page {
                    Page::Dashboard => view! { <DashboardPage/> }.into_view(),
                    Page::Employees => view! {
                        <p>"The employee directory is not available yet."</p>
                    }
                    .into_view(),
                    Page::Roles => view! { <RolesPage/> }.into_view(),
                    _ => ().into_view(),
                }}
            </main>
        </div>
    }
    .into_view()
}

#[component]
fn DashboardPage() -> impl IntoView {
    let Some(ctx) = app_context() else {
        return ().into_view();
    };

    let summary = move || {
        let session = ctx.session.get();
        let role = session.user_role().map(|r| r.name.clone()).unwrap_or_default();
        let count = session.user_permissions().len();
        format!("Signed in as {role} with {count} permission(s).")
    };

    view! {
        <section class="dashboard">
            <p>{summary}</p>
            <Can permission=Requirement::from(["view_employees", "manage_roles"])>
                <p class="hint">"Use the sidebar to manage your team."</p>
            </Can>
        </section>
    }
    .into_view()
}

/// The signed-in user's role and what each of its permissions allows.
#[component]
fn RolesPage() -> impl IntoView {
    let Some(ctx) = app_context() else {
        return ().into_view();
    };

    let rows = move || {
        let session = ctx.session.get();
        let catalog = RoleCatalog::from_roles(session.user_role().cloned());
        catalog
            .definitions()
            .into_iter()
            .map(|d| {
                view! {
                    <tr>
                        <td>{d.name}</td>
                        <td>{d.description}</td>
                        <td>{d.granted_by.join(", ")}</td>
                    </tr>
                }
            })
            .collect_view()
    };

    view! {
        <table class="permissions">
            <thead>
                <tr>
                    <th>"Permission"</th>
                    <th>"Description"</th>
                    <th>"Granted by"</th>
                </tr>
            </thead>
            <tbody>{rows}</tbody>
        </table>
    }
    .into_view()
}

#[component]
fn LoginPage() -> impl IntoView {
    let Some(ctx) = app_context() else {
        return ().into_view();
    };

    let email = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());
    let error = create_rw_signal(None::<String>);
    let busy = create_rw_signal(false);
    let query = use_query_map();

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let console = ctx.console.clone();
        let credentials = Credentials::new(email.get_untracked(), password.get_untracked());
        let return_key = console.session().paths().return_key.clone();
        let target = query
            .get_untracked()
            .get(&return_key)
            .cloned()
            .unwrap_or_else(|| console.config().home_path.clone());

        busy.set(true);
        error.set(None);
        spawn_local(async move {
            match console.session().login(&credentials).await {
                Ok(user) => {
                    tracing::info!(user_id = %user.id, "signed in");
                    console
                        .session()
                        .navigator()
                        .navigate(NavigationRequest::to(target));
                }
                Err(SessionError::Backend(e)) => error.set(Some(user_message(&e))),
                Err(e) => error.set(Some(e.to_string())),
            }
            busy.set(false);
        });
    };

    view! {
        <form class="login" on:submit=on_submit>
            <h1>"Sign in"</h1>
            <label>
                "Email"
                <input type="email" prop:value=move || email.get()
                    on:input=move |ev| email.set(event_target_value(&ev))/>
            </label>
            <label>
                "Password"
                <input type="password" prop:value=move || password.get()
                    on:input=move |ev| password.set(event_target_value(&ev))/>
            </label>
            {move || error.get().map(|e| view! { <p class="error">{e}</p> })}
            <button type="submit" disabled=move || busy.get()>"Sign in"</button>
        </form>
    }
    .into_view()
}

#[component]
fn UnauthorizedPage() -> impl IntoView {
    let home = app_context()
        .map(|ctx| ctx.console.config().home_path.clone())
        .unwrap_or_else(|| "/".to_string());

    view! {
        <section class="unauthorized">
            <h1>{Page::Unauthorized.title()}</h1>
            <p>"You do not have permission to view this page."</p>
            <A href=home>"Back to the dashboard"</A>
        </section>
    }
}

