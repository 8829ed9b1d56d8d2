use reactive_engine::{cloned, derived, effect_sync, signal, ObservableObject, ReactiveVec, SharedState};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn showcase_basics() {
    let shared = SharedState::new();
    let count = signal(&shared, 1);
    let multiplier = signal(&shared, 10);

    // Derived with cloned!: captures `count` and `multiplier` without
    // manual `.clone()` bookkeeping.
    let result = derived(&shared, cloned!(count, multiplier => move || {
        count.get() * multiplier.get()
    }));

    assert_eq!(result.get(), 10);
}

#[test]
fn showcase_observable_object() {
    let shared = SharedState::new();
    let mut user = ObservableObject::new(&shared, "user");
    user.add_observable_member("name", "Rusty".to_string());
    user.add_observable_member("shouting", false);
    user.add_computed_member("display_name", {
        let u = user.clone();
        move || {
            let name = u.get::<String>("name");
            if u.get::<bool>("shouting") {
                name.to_uppercase()
            } else {
                name
            }
        }
    });

    assert_eq!(user.get::<String>("display_name"), "Rusty");
    user.set("shouting", true);
    assert_eq!(user.get::<String>("display_name"), "RUSTY");
}

#[test]
fn showcase_reactive_vec_index_isolation() {
    let shared = SharedState::new();
    let positions = ReactiveVec::from_vec(&shared, vec![(0.0f32, 0.0f32); 5]);

    let touched = Rc::new(Cell::new(0));
    let touched_clone = touched.clone();
    let positions_rc = Rc::new(std::cell::RefCell::new(positions));
    let positions_for_effect = positions_rc.clone();

    let _render_system = effect_sync(&shared, move || {
        touched_clone.set(touched_clone.get() + 1);
        positions_for_effect.borrow_mut().get(0);
    });
    assert_eq!(touched.get(), 1);

    positions_rc.borrow_mut().set(3, (100.0, 100.0));
    assert_eq!(touched.get(), 1, "writing index 3 must not refire an index-0 reader");

    positions_rc.borrow_mut().set(0, (1.0, 1.0));
    assert_eq!(touched.get(), 2);

    assert_eq!(positions_rc.borrow().get_untracked(0), Some(&(1.0, 1.0)));
}
