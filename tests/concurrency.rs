use std::{
    sync::{
        Arc, Barrier,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use typemapper::{
    SerializerRegistry, TypeMapper,
    descriptor::{TypeDescriptor, builtins},
};

const THREADS: usize = 8;

#[test]
fn concurrent_first_lookups_compute_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let mapper = Arc::new(
        TypeMapper::builder()
            .add_hierarchy_fn(builtins::number(), move |encounter| {
                counted.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(20));
                Ok(Some(encounter.ty().to_string()))
            })
            .build(),
    );
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let mapper = Arc::clone(&mapper);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                mapper.get_class(builtins::integer()).into_value()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().as_deref(), Some("Integer"));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_lookups_of_different_types() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let registry = Arc::new(
        SerializerRegistry::<String>::builder()
            .arrays(|_, element| Ok(format!("{element}[]")))
            .build(),
    );
    registry.register_fn(builtins::object(), move |encounter| {
        counted.fetch_add(1, Ordering::SeqCst);
        Ok(Some(encounter.ty().to_string()))
    });

    let classes = [
        builtins::string(),
        builtins::integer(),
        builtins::long(),
        builtins::double(),
    ];
    let handles: Vec<_> = (0..THREADS)
        .map(|index| {
            let registry = Arc::clone(&registry);
            let class = classes[index % classes.len()];
            thread::spawn(move || {
                let element = registry.get_class(class).into_value();
                let array = registry
                    .get(&TypeDescriptor::array_of(&TypeDescriptor::of(class)))
                    .into_value();
                (element, array)
            })
        })
        .collect();

    for handle in handles {
        let (element, array) = handle.join().unwrap();
        let element = element.unwrap();
        assert_eq!(array, Some(format!("{element}[]")));
    }
    assert_eq!(calls.load(Ordering::SeqCst), classes.len());
}
