use anyhow::{Context as _, Error};
use getopts::Options;
use navstack_core::logging::{init_logging, shutdown_logging};
use navstack_core::settings::Settings;
use navstack_core::view::navigation::{
    NavigationBar, NavigationDescription, NavigationStack, PopOptions, StackNavigator,
};
use navstack_core::view::tabs::TabSelector;
use navstack_core::view::view_controller::{ViewControllerId, ViewControllerSpec};
use navstack_core::view::{
    Component, Event, NavigationMetadata, Props, SavedState, Screen, ViewProps,
};
use navstack_core::Context;
use serde_json::json;
use std::env;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver};

const DEFAULT_SETTINGS_PATH: &str = "Settings.toml";

/// A screen with a title, a back label and a scratch state it saves on unmount.
struct Page {
    name: String,
    title: String,
    back_label: Option<String>,
    nested: Option<NavigationStack>,
}

impl Page {
    fn new(name: &str, title: &str, back_label: Option<&str>) -> Rc<Page> {
        Rc::new(Page {
            name: name.to_string(),
            title: title.to_string(),
            back_label: back_label.map(str::to_string),
            nested: None,
        })
    }

    fn hosting(name: &str, stack: NavigationStack) -> Rc<Page> {
        Rc::new(Page {
            name: name.to_string(),
            title: name.to_string(),
            back_label: None,
            nested: Some(stack),
        })
    }
}

impl Component for Page {
    fn name(&self) -> &str {
        &self.name
    }

    fn mount(&self, props: ViewProps) -> Box<dyn Screen> {
        let visits = props
            .initial_state
            .as_ref()
            .and_then(|state| state.get("visits"))
            .and_then(|visits| visits.as_u64())
            .unwrap_or(0);

        Box::new(PageScreen {
            title: self.title.clone(),
            back_label: self.back_label.clone(),
            nested: self.nested.clone(),
            visits: visits + 1,
            props,
        })
    }
}

struct PageScreen {
    title: String,
    back_label: Option<String>,
    nested: Option<NavigationStack>,
    visits: u64,
    props: ViewProps,
}

impl Screen for PageScreen {
    fn update(&mut self, props: ViewProps) {
        self.props = props;
    }

    fn will_unmount(&mut self) {
        let mut state = SavedState::new();
        state.insert("visits".to_string(), json!(self.visits));
        self.props.save_state(&state);
    }

    fn navigation_metadata(&self) -> Option<&dyn NavigationMetadata> {
        Some(self)
    }

    fn nested_navigator(&self) -> Option<NavigationStack> {
        self.nested.clone()
    }
}

impl NavigationMetadata for PageScreen {
    fn navigation(&self) -> NavigationDescription {
        let mut custom = serde_json::Map::new();
        custom.insert("visits".to_string(), json!(self.visits));

        NavigationDescription {
            title: Some(self.title.clone()),
            back_label: self.back_label.clone(),
            custom,
            ..Default::default()
        }
    }
}

/// Runs deferred work and routes events until both queues are empty.
fn pump(context: &Context, rx: &Receiver<Event>, shell: &mut StackNavigator) {
    loop {
        context.scheduler.run_until_idle();
        let events: Vec<Event> = rx.try_iter().collect();
        if events.is_empty() {
            break;
        }
        for evt in &events {
            if !shell.handle_event(evt) {
                tracing::trace!(event = ?evt, "event not handled by the shell");
            }
        }
    }
}

fn print_bar(step: &str, bar: Option<&NavigationBar>) {
    let Some(state) = bar.and_then(|bar| bar.state()) else {
        println!("{:<28} (no navigation bar)", step);
        return;
    };

    let transition = bar
        .and_then(|bar| bar.last_transition())
        .map_or("none", |transition| transition.as_str());
    println!(
        "{:<28} title={:<10} back={:<5} label={:<8} transition={}",
        step,
        state.title.as_deref().unwrap_or("-"),
        state.left_arrow,
        state.left_label.as_deref().unwrap_or("-"),
        transition
    );
}

fn print_stack(stack: &NavigationStack) {
    let names: Vec<String> = stack
        .view_controllers()
        .iter()
        .filter_map(|id| stack.get_view_controller(id))
        .map(|record| record.component.name().to_string())
        .collect();
    println!("{:<28} [{}]", "  stack", names.join(", "));
}

fn run_stack_scenario(context: &Context, rx: &Receiver<Event>) {
    let animated = context.animated();
    let mut shell = StackNavigator::new(
        "main",
        ViewControllerSpec::new(Page::new("inbox", "Inbox", None)),
        context,
    );
    pump(context, rx, &mut shell);
    print_bar("mount", shell.navigation_bar());

    let stack = shell.stack().clone();
    stack.push(
        Page::new("thread", "Thread", Some("Inbox")),
        Props::new(),
        animated,
    );
    pump(context, rx, &mut shell);
    print_bar("push thread", shell.navigation_bar());

    let mut props = Props::new();
    props.insert("message".to_string(), json!(7));
    stack.push(
        Page::new("message", "Message", Some("Thread")),
        props,
        animated,
    );
    pump(context, rx, &mut shell);
    print_bar("push message", shell.navigation_bar());
    print_stack(&stack);

    if shell.navigation_bar().is_some_and(|bar| bar.tap_left()) {
        pump(context, rx, &mut shell);
        print_bar("tap back", shell.navigation_bar());
    } else {
        stack.pop(PopOptions::animated(animated));
        pump(context, rx, &mut shell);
        print_bar("pop", shell.navigation_bar());
    }
    print_stack(&stack);

    stack.pop_to_root(PopOptions::animated(animated));
    pump(context, rx, &mut shell);
    print_bar("pop to root", shell.navigation_bar());

    let missing = stack.pop_to_view(&ViewControllerId::new(), PopOptions::default());
    pump(context, rx, &mut shell);
    println!(
        "{:<28} {}",
        "pop to unknown view",
        missing.map_or("ignored".to_string(), |id| id.to_string())
    );
    print_stack(&stack);
}

fn run_nested_scenario(context: &Context, rx: &Receiver<Event>) {
    let inner = NavigationStack::new(
        "library",
        ViewControllerSpec::new(Page::new("shelf", "Shelf", None)),
        context,
    );
    let mut shell = StackNavigator::new(
        "outer",
        ViewControllerSpec::new(Page::hosting("library", inner.clone())),
        context,
    );
    pump(context, rx, &mut shell);
    print_bar("nested mount", shell.navigation_bar());

    inner.push(
        Page::new("book", "Book", Some("Shelf")),
        Props::new(),
        context.animated(),
    );
    shell.stack().refresh_navigation();
    pump(context, rx, &mut shell);
    print_bar("nested push", shell.navigation_bar());
}

fn run_tabs_scenario(context: &Context, rx: &Receiver<Event>) -> Result<(), Error> {
    let tabs = TabSelector::new(
        "tabs",
        vec![
            ViewControllerSpec::new(Page::new("home", "Home", None)).tab("Home"),
            ViewControllerSpec::new(Page::new("search", "Search", None)).tab("Search"),
            ViewControllerSpec::new(Page::new("profile", "Profile", None)),
        ],
        context,
    )?;
    println!("tabs at {:?}", tabs.position());

    for index in [1, 0, 1] {
        tabs.set_selected_index(index)?;
        context.scheduler.run_until_idle();
        let visits = tabs
            .with_active_screen(|screen| {
                screen
                    .downcast_ref::<PageScreen>()
                    .map(|screen| screen.visits)
            })
            .flatten()
            .unwrap_or(0);
        let labels: Vec<String> = tabs
            .tabs()
            .iter()
            .map(|item| {
                if item.selected {
                    format!("[{}]", item.label)
                } else {
                    item.label.clone()
                }
            })
            .collect();
        println!("{:<28} {} visits={}", "select tab", labels.join(" "), visits);
    }

    if let Err(e) = tabs.set_selected_index(tabs.tab_count()) {
        println!("{:<28} {}", "select out of range", e);
    }

    let items = tabs.tabs();
    if let Some(item) = items.last() {
        (item.on_select)();
        println!("{:<28} index={}", "tap last tab", tabs.selected_index());
    }

    let drained = rx.try_iter().count();
    tracing::debug!(drained, "tab events drained");

    Ok(())
}

fn run() -> Result<(), Error> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut opts = Options::new();
    opts.optopt(
        "s",
        "settings",
        "Path to the settings file.",
        "SETTINGS_PATH",
    );
    opts.optflag("h", "help", "Print this help message.");

    let matches = opts.parse(&args).context("failed to parse the command line arguments")?;

    if matches.opt_present("h") {
        print!("{}", opts.usage("Usage: navstack-demo [-s SETTINGS_PATH]"));
        return Ok(());
    }

    let settings_path = matches
        .opt_str("s")
        .unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string());
    let settings = Settings::load_or_default(&settings_path);

    init_logging(&settings.logging)?;
    tracing::info!(settings = %settings_path, "starting demo");

    let (hub, rx) = channel();
    let context = Context::new(hub, settings);

    run_stack_scenario(&context, &rx);
    run_nested_scenario(&context, &rx);
    run_tabs_scenario(&context, &rx)?;

    Ok(())
}

fn main() -> Result<(), Error> {
    let result = run();

    if let Err(e) = &result {
        tracing::error!(error = %e, "demo failed");
    }

    shutdown_logging();

    result
}
