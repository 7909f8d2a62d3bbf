//! Headless feed demo.
//!
//! Wires a fake cursor-paged backend through the list adapter, drives the
//! two-layer feed with a scripted gesture session, then runs the same data
//! through the snap pager. Run with `--features logging` for state-machine
//! debug output.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::Result;

use swipereel_core::{
    FeedCallbacks, FeedItem, FeedPage, ManualClock, PagedFeed, SortMode, TopRange,
};
use swipereel_foundation::{
    FeedSpec, LayerId, PagerSpec, SnapPagerState, TwoLayerFeedState, COMMIT_THRESHOLD,
};
use swipereel_ui::{overlay_view, press_like, OverlayProps, SurfaceFrame, VideoSurface};

const VIDEO_A: &str =
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerJoyrides.mp4";
const VIDEO_B: &str =
    "https://test-videos.co.uk/vids/bigbuckbunny/mp4/h264/1080/Big_Buck_Bunny_1080_10s_1MB.mp4";

const CATEGORIES: [&str; 5] = ["s/realestate", "s/home", "s/auto", "s/electronics", "s/food"];

const PAGE_SIZE: usize = 12;
const VIEWPORT_HEIGHT: f32 = 780.0;

fn generate_items(start: usize, count: usize) -> Vec<FeedItem> {
    (start..start + count)
        .map(|i| {
            let uri = if i % 2 == 0 { VIDEO_A } else { VIDEO_B };
            FeedItem::new(format!("p{i}"), Some(uri))
                .with_description(format!("auto-generated post #{i}"))
                .with_creator(format!("agent_{}", i % 10))
                .with_category(CATEGORIES[i % CATEGORIES.len()])
                .with_counts((i * 7 % 100) as u32, (i * 3 % 20) as u32)
                .with_created_at(1_700_000_000_000 + i as i64 * 60_000)
        })
        .collect()
}

/// Stand-in for the network: serves sequential pages, one at a time.
struct FakeBackend {
    served: usize,
}

impl FakeBackend {
    fn serve(&mut self, limit: usize) -> FeedPage {
        let items = generate_items(self.served, limit);
        self.served += limit;
        FeedPage::from_items(items, limit)
    }
}

/// Runs any pending next-page fetch to completion.
fn pump(feed: &Rc<RefCell<PagedFeed>>, backend: &Rc<RefCell<FakeBackend>>) {
    let request = feed.borrow_mut().fetch_next_page();
    if let Some(request) = request {
        let page = backend.borrow_mut().serve(request.limit);
        feed.borrow_mut().complete_fetch(page);
    }
}

fn swipe(state: &TwoLayerFeedState, clock: &ManualClock, total_dy: f32) {
    state.pointer_down();
    for _ in 0..10 {
        clock.advance(16);
        state.drag_by(total_dy / 10.0);
    }
    state.pointer_up();
}

fn render(state: &TwoLayerFeedState, surfaces: &mut [VideoSurface; 2]) {
    let frames = state.frames();
    for (layer, frame) in [LayerId::A, LayerId::B].into_iter().zip(frames) {
        surfaces[layer.index()].set_item(state.item_for(layer).as_ref());
        surfaces[layer.index()].set_paused(!frame.playing);
        let what = match surfaces[layer.index()].frame() {
            SurfaceFrame::Placeholder => "placeholder".to_string(),
            SurfaceFrame::Video { source, playing } => {
                format!("{} ({})", source.uri, if playing { "playing" } else { "paused" })
            }
        };
        println!(
            "  layer {layer:?}: item={:?} offset={:.1} z={} -> {what}",
            frame.item_index, frame.offset_y, frame.stack_order
        );
    }
    if let Some(item) = state.active_item() {
        let view = overlay_view(&OverlayProps::for_item(&item));
        println!(
            "  overlay: {} \"{}\" ♥{} 💬{}",
            view.creator, view.description, view.like_count, view.comment_count
        );
    }
}

fn main() -> Result<()> {
    #[cfg(feature = "logging")]
    env_logger::init();

    let clock = ManualClock::new();
    let feed = Rc::new(RefCell::new(PagedFeed::with_page_size(PAGE_SIZE)));
    let backend = Rc::new(RefCell::new(FakeBackend { served: 0 }));
    let state = TwoLayerFeedState::with_clock(FeedSpec::default(), Rc::new(clock.clone()));

    let reload_wanted = Rc::new(Cell::new(false));
    let active_id = Rc::new(RefCell::new(None::<String>));
    {
        let reload_wanted = reload_wanted.clone();
        let active_id = active_id.clone();
        state.set_callbacks(
            FeedCallbacks::new()
                .on_active_change(|item| {
                    println!("[event] active -> {:?}", item.map(|item| item.id.clone()))
                })
                .set_active_id(move |id| *active_id.borrow_mut() = Some(id.to_string()))
                .on_reload(move || reload_wanted.set(true)),
        );
    }

    // First page, then hand the list to the feed.
    pump(&feed, &backend);
    state.sync(&feed.borrow_mut().snapshot(), None);

    let mut surfaces = [VideoSurface::new(), VideoSurface::new()];
    println!("initial frame:");
    render(&state, &mut surfaces);

    println!("\nswiping forward through the feed:");
    for step in 0..10 {
        swipe(&state, &clock, -(COMMIT_THRESHOLD + 60.0));
        if reload_wanted.replace(false) {
            pump(&feed, &backend);
            let snapshot = feed.borrow_mut().snapshot();
            let id = active_id.borrow().clone();
            state.sync(&snapshot, id.as_deref());
            println!("  (adapter served another page: {} items known)", snapshot.len());
        }
        println!("after swipe {}:", step + 1);
        render(&state, &mut surfaces);
    }

    println!("\nliking the active item (optimistic bump through the adapter):");
    let mut overlay_callbacks = FeedCallbacks::new().on_like({
        let feed = feed.clone();
        move |item, delta| feed.borrow_mut().apply_like(&item.id, delta)
    });
    if let Some(item) = state.active_item() {
        press_like(&OverlayProps::for_item(&item), &mut overlay_callbacks);
        let snapshot = feed.borrow_mut().snapshot();
        let id = active_id.borrow().clone();
        state.sync(&snapshot, id.as_deref());
        if let Some(item) = state.active_item() {
            println!(
                "  {} now has {} hearts (liked={})",
                item.id, item.like_count, item.liked
            );
        }
    }

    println!("\ntap pauses, second tap within 300ms is swallowed:");
    clock.advance(1_000);
    state.pointer_down();
    state.pointer_up();
    clock.advance(100);
    state.pointer_down();
    state.pointer_up();
    println!("  paused = {}", state.is_paused());

    println!("\nswitching sort to Top/30d resets to the head of the new ordering:");
    let request = feed.borrow_mut().set_sort(SortMode::Top, TopRange::Days30);
    if request.is_some() {
        let page = backend.borrow_mut().serve(PAGE_SIZE);
        feed.borrow_mut().complete_fetch(page);
    }
    let snapshot = feed.borrow_mut().snapshot();
    let id = active_id.borrow().clone();
    state.sync(&snapshot, id.as_deref());
    render(&state, &mut surfaces);

    // The same adapter data through the alternate presentation.
    println!("\nsnap pager over the same adapter:");
    let pager = SnapPagerState::with_clock(PagerSpec::default(), Rc::new(clock.clone()));
    pager.set_viewport(VIEWPORT_HEIGHT);
    pager.set_callbacks(
        FeedCallbacks::new()
            .on_active_change(|item| {
                println!("[pager] active -> {:?}", item.map(|item| item.id.clone()))
            })
            .on_refresh(|| println!("[pager] refresh requested")),
    );
    clock.advance(1_000);
    pager.sync(&feed.borrow_mut().snapshot());
    println!("  content = {:?}", pager.content());

    pager.scroll_to(1.4 * VIEWPORT_HEIGHT);
    pager.settle();
    println!(
        "  settled on page {} at offset {:.1}",
        pager.active_index(),
        pager.scroll_offset()
    );

    // Deep pull at the top releases into a refresh.
    pager.scroll_to(0.0);
    pager.settle();
    pager.scroll_to(-120.0);
    pager.settle();

    log::info!("demo finished");
    Ok(())
}
